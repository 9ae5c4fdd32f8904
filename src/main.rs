use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use storyweaver::core::config::Config;
use storyweaver::core::io::NativeStorage;
use storyweaver::services::binder::BookBinder;
use storyweaver::services::form::collect_story_configuration;
use storyweaver::services::image::create_image_client;
use storyweaver::services::llm::create_text_client;
use storyweaver::services::progress::ProgressBarSink;
use storyweaver::services::workflow::StoryOrchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    // 1. Load Config
    let config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            eprintln!("Please ensure 'config.yml' exists with text and image provider settings.");
            return Err(e);
        }
    };

    config.ensure_directories()?;

    // 2. Collect the story request
    let story_config = collect_story_configuration(&config)?;

    // 3. Initialize clients
    let text = create_text_client(&config.text)?;
    let image = create_image_client(&config.image)?;

    // 4. Generate
    let orchestrator = StoryOrchestrator::new(text, image)
        .with_binding_delay(Duration::from_millis(config.binding_delay_ms));
    let progress = ProgressBarSink::new()?;
    let story = orchestrator.generate(&story_config, &progress).await;
    progress.finish();

    // 5. Bind the book
    let binder = BookBinder::new(Arc::new(NativeStorage::new()), &config.output_folder);
    let book_dir = binder.bind(&story).await?;

    println!("Your storybook \"{}\" is ready: {}", story.title, book_dir);
    Ok(())
}
