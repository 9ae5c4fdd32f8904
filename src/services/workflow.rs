use crate::core::story::{GenerationProgress, ImageRef, Page, Story, StoryConfiguration};
use crate::services::image::ImageGenerationClient;
use crate::services::llm::TextGenerationClient;
use crate::services::progress::ProgressSink;
use crate::services::prompts;
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;

pub struct StoryOrchestrator {
    text: Arc<dyn TextGenerationClient>,
    image: Arc<dyn ImageGenerationClient>,
    binding_delay: Duration,
}

impl StoryOrchestrator {
    pub fn new(text: Arc<dyn TextGenerationClient>, image: Arc<dyn ImageGenerationClient>) -> Self {
        Self {
            text,
            image,
            binding_delay: Duration::ZERO,
        }
    }

    /// Pause between the final progress update and returning the story.
    pub fn with_binding_delay(mut self, delay: Duration) -> Self {
        self.binding_delay = delay;
        self
    }

    /// Runs the whole generation sequence. Both clients degrade to fallback
    /// content instead of failing, so this always yields `page_count` pages.
    pub async fn generate(
        &self,
        config: &StoryConfiguration,
        progress: &dyn ProgressSink,
    ) -> Story {
        info!(
            "Generating a {}-page {} story about {}",
            config.page_count,
            config.theme.key(),
            config.character_name
        );

        progress.report(GenerationProgress::new("Dreaming up a title...", 10.0));
        let raw_title = self.text.generate(&prompts::title_prompt(config)).await;
        let title = prompts::clean_title(&raw_title);
        debug!("Title: {}", title);
        progress.report(GenerationProgress::new("Painting the cover...", 20.0));

        let cover = self
            .image
            .generate(&prompts::cover_prompt(config, &title))
            .await;
        progress.report(
            GenerationProgress::new("The cover is ready!", 40.0).with_partial(&title, &cover),
        );

        let mut pages: Vec<Page> = Vec::with_capacity(config.page_count);
        for _ in 0..config.page_count {
            let page = self.next_page(config, &title, &cover, &pages, progress).await;
            pages.push(page);
        }

        progress.report(GenerationProgress::new("Binding the book!", 100.0).with_partial(&title, &cover));

        if !self.binding_delay.is_zero() {
            tokio::time::sleep(self.binding_delay).await;
        }

        info!("Story \"{}\" finished with {} pages", title, pages.len());
        Story { title, cover, pages }
    }

    /// Writes and illustrates the page following `previous`.
    async fn next_page(
        &self,
        config: &StoryConfiguration,
        title: &str,
        cover: &ImageRef,
        previous: &[Page],
        progress: &dyn ProgressSink,
    ) -> Page {
        let number = previous.len() + 1;
        let total = config.page_count;
        // Pages share the 40..90 band evenly.
        let step = 50.0 / total as f32;
        let percent = 40.0 + previous.len() as f32 * step;

        progress.report(
            GenerationProgress::new(format!("Writing page {} of {}...", number, total), percent)
                .with_partial(title, cover),
        );
        let text = self
            .text
            .generate(&prompts::page_text_prompt(config, title, previous))
            .await;

        progress.report(
            GenerationProgress::new(
                format!("Illustrating page {} of {}...", number, total),
                percent + step / 2.0,
            )
            .with_partial(title, cover),
        );
        let image = self
            .image
            .generate(&prompts::page_image_prompt(config, previous.len(), &text))
            .await;

        Page { text, image }
    }
}
