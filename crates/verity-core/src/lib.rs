use serde::{Deserialize, Serialize};

pub mod history;
pub mod tool;

pub use history::History;
pub use tool::{CompletedToolCall, Tool, ToolDefinition, ToolRegistry};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("fetch failed: {0}")]
    Fetch(String),
    #[error("fetch failed: HTTP {status} for {url}")]
    FetchStatus { url: String, status: u16 },
    #[error("model call failed: {0}")]
    Model(String),
    #[error("model output failed validation: {0}")]
    Validation(String),
    #[error("prompt template error: {0}")]
    Template(String),
    #[error("not configured: {0}")]
    NotConfigured(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Binary classification derived from the model's fakeness score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Real,
    Fake,
}

impl Verdict {
    /// Fake iff `score > 0.5`. A score of exactly 0.5 resolves to Real.
    pub fn from_score(score: f64) -> Self {
        if score > 0.5 {
            Verdict::Fake
        } else {
            Verdict::Real
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Real => write!(f, "Real"),
            Verdict::Fake => write!(f, "Fake"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionRequest {
    /// Article text, or a URL to fetch the article from.
    pub input: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionReport {
    pub verdict: Verdict,
    /// Likelihood of the input being fake news, in [0, 1].
    pub score: f64,
    pub cleaned_input: String,
    pub reasoning: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperStyle {
    Academic,
    Professional,
    Concise,
    Detailed,
}

impl PaperStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaperStyle::Academic => "academic",
            PaperStyle::Professional => "professional",
            PaperStyle::Concise => "concise",
            PaperStyle::Detailed => "detailed",
        }
    }
}

impl std::str::FromStr for PaperStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "academic" => Ok(PaperStyle::Academic),
            "professional" => Ok(PaperStyle::Professional),
            "concise" => Ok(PaperStyle::Concise),
            "detailed" => Ok(PaperStyle::Detailed),
            other => Err(format!(
                "unknown paper style {other:?} (allowed: academic, professional, concise, detailed)"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchRequest {
    pub topic: String,
    #[serde(default = "default_style")]
    pub style: PaperStyle,
    #[serde(default = "default_word_count")]
    pub word_count: u32,
}

fn default_style() -> PaperStyle {
    PaperStyle::Academic
}

fn default_word_count() -> u32 {
    1500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperSection {
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsections: Option<Vec<PaperSection>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchPaper {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub sections: Vec<PaperSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<String>>,
}

impl ResearchPaper {
    /// Render the paper as markdown (the download/export path).
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {}\n\n", self.title));
        out.push_str("## Abstract\n\n");
        out.push_str(self.abstract_text.trim());
        out.push_str("\n\n");
        for section in &self.sections {
            out.push_str(&format!("## {}\n\n{}\n\n", section.title, section.content.trim()));
            if let Some(subsections) = &section.subsections {
                for sub in subsections {
                    out.push_str(&format!("### {}\n\n{}\n\n", sub.title, sub.content.trim()));
                }
            }
        }
        if let Some(references) = &self.references {
            if !references.is_empty() {
                out.push_str("## References\n\n");
                for (i, r) in references.iter().enumerate() {
                    out.push_str(&format!("{}. {}\n", i + 1, r));
                }
            }
        }
        out
    }
}

/// Title and visible text extracted from a fetched web page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContent {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub system: Option<String>,
    pub prompt: String,
}

/// Final structured output plus the tool calls the model completed on the way.
#[derive(Debug, Clone)]
pub struct GenerateResponse {
    pub output: serde_json::Value,
    pub tool_calls: Vec<CompletedToolCall>,
}

#[async_trait::async_trait]
pub trait FetchBackend: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<PageContent>;
}

#[async_trait::async_trait]
pub trait ModelBackend: Send + Sync {
    /// Invoke the model with a rendered prompt. Tools in `registry` are
    /// declared to the model and run locally when it calls them.
    async fn generate(
        &self,
        req: &GenerateRequest,
        registry: &ToolRegistry,
    ) -> Result<GenerateResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn verdict_threshold_boundary_is_real() {
        assert_eq!(Verdict::from_score(0.5), Verdict::Real);
        assert_eq!(Verdict::from_score(0.500001), Verdict::Fake);
        assert_eq!(Verdict::from_score(0.0), Verdict::Real);
        assert_eq!(Verdict::from_score(1.0), Verdict::Fake);
    }

    #[test]
    fn paper_style_round_trips_from_str() {
        for s in ["academic", "professional", "concise", "detailed"] {
            let style: PaperStyle = s.parse().unwrap();
            assert_eq!(style.as_str(), s);
        }
        assert!("lyrical".parse::<PaperStyle>().is_err());
    }

    #[test]
    fn research_paper_serde_uses_abstract_key() {
        let paper: ResearchPaper = serde_json::from_value(serde_json::json!({
            "title": "T",
            "abstract": "A",
            "sections": [
                {"title": "S1", "content": "C1"},
                {"title": "S2", "content": "C2", "subsections": [{"title": "S2a", "content": "C2a"}]},
                {"title": "S3", "content": "C3"}
            ],
            "references": ["R1"]
        }))
        .unwrap();
        assert_eq!(paper.abstract_text, "A");

        let v = serde_json::to_value(&paper).unwrap();
        assert!(v.get("abstract").is_some());
        assert!(v.get("abstract_text").is_none());
    }

    #[test]
    fn markdown_rendering_covers_all_parts() {
        let paper = ResearchPaper {
            title: "On Things".to_string(),
            abstract_text: "Short summary.".to_string(),
            sections: vec![
                PaperSection {
                    title: "Intro".to_string(),
                    content: "Opening.".to_string(),
                    subsections: Some(vec![PaperSection {
                        title: "Background".to_string(),
                        content: "Context.".to_string(),
                        subsections: None,
                    }]),
                },
                PaperSection {
                    title: "Body".to_string(),
                    content: "Middle.".to_string(),
                    subsections: None,
                },
                PaperSection {
                    title: "End".to_string(),
                    content: "Closing.".to_string(),
                    subsections: None,
                },
            ],
            references: Some(vec!["Someone, 2021".to_string()]),
        };
        let md = paper.to_markdown();
        assert!(md.starts_with("# On Things\n"));
        assert!(md.contains("## Abstract"));
        assert!(md.contains("### Background"));
        assert!(md.contains("## References"));
        assert!(md.contains("1. Someone, 2021"));
    }

    proptest! {
        #[test]
        fn verdict_is_fake_iff_score_above_half(score in 0.0f64..=1.0) {
            let v = Verdict::from_score(score);
            prop_assert_eq!(v == Verdict::Fake, score > 0.5);
        }
    }
}
