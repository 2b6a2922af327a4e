use likeness::{GeminiClient, Session};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let Some(prompt) = args.next() else {
        eprintln!("usage: playground <prompt> [output.png]");
        std::process::exit(2);
    };
    let output = args.next().unwrap_or_else(|| "playground.png".to_string());

    let mut session = Session::new(GeminiClient::from_env()?);
    session.playground.set_prompt(prompt);

    println!("Generating...");
    session.generate_playground().await?;

    if let Some(image) = session.playground.generated_image() {
        image.save(&output).await?;
        println!("Saved {}", output);
    } else if let Some(error) = session.playground.visible_error() {
        eprintln!("{}", error);
        std::process::exit(1);
    }

    Ok(())
}
