use std::{env, fs, path::PathBuf};

fn common_args(cmd: clap::Command) -> clap::Command {
    cmd.arg(clap::arg!(<INPUT> "Local file, or '-' for stdin"))
        .arg(
            clap::arg!(-o --output <FILE> "Output file (default: stdout)")
                .value_name("FILE")
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(clap::arg!(--"allow-embeds" "Keep iframes from safelisted embed providers"))
        .arg(
            clap::arg!(--"embed-provider" <PREFIX> "Embed provider prefix to safelist, replacing the defaults")
                .action(clap::ArgAction::Append),
        )
        .arg(clap::arg!(-v --verbose "Enable debug logging"))
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=OUT_DIR");

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let completions_dir = out_dir.join("completions");

    fs::create_dir_all(&completions_dir).unwrap();

    let parse = common_args(clap::Command::new("parse").about("Parse a retrieved feed and print the result as JSON"))
        .arg(clap::arg!(--url <URL> "URL the input was retrieved from"))
        .arg(clap::arg!(--status <CODE> "HTTP status code of the retrieval").default_value("200"))
        .arg(clap::arg!(--pretty "Pretty-print the JSON output"));

    let sanitize = common_args(clap::Command::new("sanitize").about("Sanitize an HTML fragment"))
        .arg(clap::arg!(--"base-url" <URL> "Resolve relative URLs against this base"))
        .arg(clap::arg!(--"no-images" "Strip images and other media from output"))
        .arg(clap::arg!(--text "Print plain text instead of HTML"));

    let mut cmd = clap::Command::new("postscope")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Postscope Contributors")
        .about("Normalize feeds and sanitize untrusted HTML")
        .subcommand_required(true)
        .subcommand(parse)
        .subcommand(sanitize);

    clap_complete::generate_to(clap_complete::shells::Bash, &mut cmd, "postscope", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Zsh, &mut cmd, "postscope", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::Fish, &mut cmd, "postscope", &completions_dir).unwrap();
    clap_complete::generate_to(clap_complete::shells::PowerShell, &mut cmd, "postscope", &completions_dir).unwrap();

    println!(
        "cargo:warning=Shell completions generated in: {}",
        completions_dir.display()
    );
}
