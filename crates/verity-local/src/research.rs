//! Research paper generation flow.

use verity_core::tool::ToolRegistry;
use verity_core::{Error, GenerateRequest, ModelBackend, ResearchPaper, ResearchRequest, Result};

use crate::{prompt, tools};

/// The prompt contract asks for exactly this many top-level sections.
const PAPER_SECTIONS: usize = 3;

const RESEARCH_PROMPT: &str = "\
You are an AI research assistant tasked with generating research papers on \
given topics.

The user has requested a research paper on the following topic: {{topic}}
Here is the strategy for incorporating the topic: {{strategy}}
Write in a {{style}} style, targeting roughly {{word_count}} words in total.

Generate a research paper with a title, an abstract, and exactly 3 sections. \
Each section has a title and content, and may optionally have subsections. \
Respond with a JSON object in this shape:

{
  \"title\": \"Research Paper Title\",
  \"abstract\": \"A brief summary of the research paper.\",
  \"sections\": [
    { \"title\": \"Section 1 Title\", \"content\": \"Section 1 Content\" },
    { \"title\": \"Section 2 Title\", \"content\": \"Section 2 Content\" },
    { \"title\": \"Section 3 Title\", \"content\": \"Section 3 Content\" }
  ],
  \"references\": [\"Reference 1\"]
}
";

pub async fn generate_research_paper(
    model: &dyn ModelBackend,
    req: &ResearchRequest,
) -> Result<ResearchPaper> {
    // The strategy tool runs locally up front; it is also declared to the
    // model so it can re-invoke it mid-generation if it wants to.
    let strategy = tools::incorporation_strategy(&req.topic);

    let mut registry = ToolRegistry::new();
    registry.register(tools::incorporation_strategy_tool());

    let rendered = prompt::render(
        RESEARCH_PROMPT,
        &[
            ("topic", req.topic.as_str()),
            ("strategy", strategy.as_str()),
            ("style", req.style.as_str()),
            ("word_count", &req.word_count.to_string()),
        ],
    )?;

    let resp = model
        .generate(
            &GenerateRequest {
                system: None,
                prompt: rendered,
            },
            &registry,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "research paper model call failed");
            e
        })?;

    let paper: ResearchPaper = serde_json::from_value(resp.output)
        .map_err(|e| Error::Validation(format!("research paper output: {e}")))?;
    validate_paper(&paper)?;
    Ok(paper)
}

fn validate_paper(paper: &ResearchPaper) -> Result<()> {
    if paper.title.trim().is_empty() {
        return Err(Error::Validation("paper title is empty".to_string()));
    }
    if paper.abstract_text.trim().is_empty() {
        return Err(Error::Validation("paper abstract is empty".to_string()));
    }
    if paper.sections.len() != PAPER_SECTIONS {
        return Err(Error::Validation(format!(
            "expected exactly {PAPER_SECTIONS} sections, model returned {}",
            paper.sections.len()
        )));
    }
    Ok(())
}
