use likeness::{GeminiClient, Session};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(photo), Some(scene)) = (args.next(), args.next()) else {
        eprintln!("usage: portrait <photo> <scene prompt> [output.png]");
        std::process::exit(2);
    };
    let output = args.next().unwrap_or_else(|| "portrait.png".to_string());

    // Reads GEMINI_API_KEY; a missing key surfaces as a studio error below.
    let client = GeminiClient::from_env()?;
    let mut session = Session::new(client);

    // Step 1: upload
    session.upload_file(&photo).await?;
    if let Some(error) = session.portrait.visible_error() {
        eprintln!("{}", error);
        std::process::exit(1);
    }

    // Step 2: describe the face
    println!("Analyzing face...");
    session.analyze_face().await?;
    if let Some(error) = session.portrait.visible_error() {
        eprintln!("{}", error);
        std::process::exit(1);
    }
    println!("Description: {}", session.portrait.description());

    // Step 3: paint it into the scene
    session.portrait.set_scene(scene);
    println!("Generating portrait...");
    session.generate_portrait().await?;

    match session.portrait.generated_image() {
        Some(image) => {
            image.save(&output).await?;
            println!("Saved {}", output);
        }
        None => {
            if let Some(error) = session.portrait.visible_error() {
                eprintln!("{}", error);
            }
            std::process::exit(1);
        }
    }

    Ok(())
}
