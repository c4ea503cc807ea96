use fedmeta::{
    config::{load_whitelist, Args, HELP},
    extract_with,
    source::{AnySource, Source},
    Result, TracingSink,
};

async fn run(args: Args) -> Result<()> {
    let source = AnySource::default();
    let mut stdout = std::io::stdout();

    match &args.whitelist {
        Some(path) => {
            let whitelist = load_whitelist(path)?;
            let mapped = fedmeta::load(&source, &args.metadata, &whitelist, &args.rules).await?;
            serde_json::to_writer_pretty(&mut stdout, &mapped)?;
        }
        None => {
            let document = source.fetch(&args.metadata).await?;
            let descriptors = extract_with(&document, &args.rules, TracingSink)?;
            serde_json::to_writer_pretty(&mut stdout, &descriptors)?;
        }
    }
    println!();
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = match Args::parse(pico_args::Arguments::from_env()) {
        Ok(Some(args)) => args,
        Ok(None) => {
            eprintln!("{}", HELP);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("{}\n{}", e, HELP);
            std::process::exit(2);
        }
    };

    fedmeta::init_logging();

    if let Err(e) = run(args).await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}
