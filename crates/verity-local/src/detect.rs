//! Fake-news detection flow.
//!
//! One linear pipeline: optional URL fetch, one model invocation with the
//! reasoning tool declared, then verdict derivation from the score.

use serde::Deserialize;
use verity_core::tool::ToolRegistry;
use verity_core::{
    DetectionReport, DetectionRequest, Error, FetchBackend, GenerateRequest, ModelBackend, Result,
    Verdict,
};

use crate::{prompt, tools};

const DETECT_PROMPT: &str = "\
You are a fake news detection expert. You will be given an article and you \
will determine if it is real or fake news.

Article: {{article}}

Respond with a JSON object containing:
- \"label\": \"Real\" or \"Fake\"
- \"score\": a number between 0 and 1 indicating the likelihood that the article is fake news
- \"cleaned_input\": a cleaned version of the input text

Consider the following:
- Sensationalism
- Lack of sourcing
- Bias
";

pub const FALLBACK_FAKE_REASONING: &str =
    "The article is classified as fake, but no specific reasoning was provided by the tool.";
pub const NO_REASONING_FOR_REAL: &str = "No specific reasoning available for real news.";

#[derive(Debug, Deserialize)]
struct DetectOutput {
    /// The model's own classification; advisory only, the verdict is
    /// derived by thresholding the score.
    label: Verdict,
    score: f64,
    cleaned_input: String,
}

fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

pub async fn detect_fake_news(
    model: &dyn ModelBackend,
    fetcher: &dyn FetchBackend,
    req: &DetectionRequest,
) -> Result<DetectionReport> {
    let article = if is_url(&req.input) {
        let page = fetcher.fetch_page(&req.input).await.map_err(|e| {
            tracing::error!(url = %req.input, error = %e, "fetching article url failed");
            Error::Fetch(format!("failed to fetch content from the provided URL: {e}"))
        })?;
        page.content
    } else {
        req.input.clone()
    };

    let mut registry = ToolRegistry::new();
    registry.register(tools::extract_reasoning_tool());

    let rendered = prompt::render(DETECT_PROMPT, &[("article", &article)])?;
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
            tracing::error!(error = %e, "fake-news detection model call failed");
            e
        })?;

    let out: DetectOutput = serde_json::from_value(resp.output)
        .map_err(|e| Error::Validation(format!("detection output: {e}")))?;
    if !(0.0..=1.0).contains(&out.score) {
        return Err(Error::Validation(format!(
            "detection score {} outside [0, 1]",
            out.score
        )));
    }

    let verdict = Verdict::from_score(out.score);
    if out.label != verdict {
        tracing::debug!(label = %out.label, %verdict, score = out.score,
            "model label disagrees with thresholded verdict");
    }

    let reasoning = match verdict {
        Verdict::Real => NO_REASONING_FOR_REAL.to_string(),
        Verdict::Fake => resp
            .tool_calls
            .iter()
            .find_map(|call| {
                if call.name == tools::EXTRACT_REASONING {
                    call.output.as_str().map(str::to_string)
                } else {
                    tracing::warn!(tool = %call.name, "unexpected tool call in detection transcript");
                    None
                }
            })
            .unwrap_or_else(|| FALLBACK_FAKE_REASONING.to_string()),
    };

    Ok(DetectionReport {
        verdict,
        score: out.score,
        cleaned_input: out.cleaned_input,
        reasoning: Some(reasoning),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use verity_core::{CompletedToolCall, GenerateResponse, PageContent};

    struct StubModel {
        response: Result<GenerateResponse>,
        prompts: Mutex<Vec<String>>,
    }

    impl StubModel {
        fn returning(output: Value, tool_calls: Vec<CompletedToolCall>) -> Self {
            Self {
                response: Ok(GenerateResponse { output, tool_calls }),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl ModelBackend for StubModel {
        async fn generate(
            &self,
            req: &GenerateRequest,
            _registry: &ToolRegistry,
        ) -> Result<GenerateResponse> {
            self.prompts.lock().unwrap().push(req.prompt.clone());
            match &self.response {
                Ok(resp) => Ok(resp.clone()),
                Err(e) => Err(Error::Model(e.to_string())),
            }
        }
    }

    struct StubFetcher {
        result: Result<PageContent>,
    }

    #[async_trait::async_trait]
    impl FetchBackend for StubFetcher {
        async fn fetch_page(&self, _url: &str) -> Result<PageContent> {
            match &self.result {
                Ok(p) => Ok(p.clone()),
                Err(e) => Err(Error::Fetch(e.to_string())),
            }
        }
    }

    fn failing_fetcher() -> StubFetcher {
        StubFetcher {
            result: Err(Error::Fetch("connection refused".to_string())),
        }
    }

    const MOON_LANDING: &str = "The moon landing was faked by NASA in a Hollywood studio.";

    #[tokio::test]
    async fn built_in_example_yields_well_formed_report() {
        let model = StubModel::returning(
            json!({"label": "Fake", "score": 0.92, "cleaned_input": MOON_LANDING}),
            vec![CompletedToolCall {
                name: tools::EXTRACT_REASONING.to_string(),
                output: json!("The article is fake because of these reasons found in the article: ..."),
            }],
        );
        let req = DetectionRequest {
            input: MOON_LANDING.to_string(),
        };

        let report = detect_fake_news(&model, &failing_fetcher(), &req)
            .await
            .unwrap();
        assert_eq!(report.verdict, Verdict::Fake);
        assert!((0.0..=1.0).contains(&report.score));
        assert!(!report.cleaned_input.is_empty());
        assert!(report
            .reasoning
            .as_deref()
            .unwrap()
            .starts_with("The article is fake"));
    }

    #[tokio::test]
    async fn fake_without_tool_call_uses_fallback_reasoning() {
        let model = StubModel::returning(
            json!({"label": "Fake", "score": 0.8, "cleaned_input": "c"}),
            vec![],
        );
        let req = DetectionRequest {
            input: "text".to_string(),
        };

        let report = detect_fake_news(&model, &failing_fetcher(), &req)
            .await
            .unwrap();
        assert_eq!(report.reasoning.as_deref(), Some(FALLBACK_FAKE_REASONING));
    }

    #[tokio::test]
    async fn real_verdict_gets_fixed_no_reasoning_string() {
        let model = StubModel::returning(
            json!({"label": "Real", "score": 0.1, "cleaned_input": "c"}),
            vec![],
        );
        let req = DetectionRequest {
            input: "text".to_string(),
        };

        let report = detect_fake_news(&model, &failing_fetcher(), &req)
            .await
            .unwrap();
        assert_eq!(report.verdict, Verdict::Real);
        assert_eq!(report.reasoning.as_deref(), Some(NO_REASONING_FOR_REAL));
    }

    #[tokio::test]
    async fn score_exactly_half_resolves_to_real() {
        let model = StubModel::returning(
            json!({"label": "Fake", "score": 0.5, "cleaned_input": "c"}),
            vec![],
        );
        let req = DetectionRequest {
            input: "text".to_string(),
        };

        let report = detect_fake_news(&model, &failing_fetcher(), &req)
            .await
            .unwrap();
        assert_eq!(report.verdict, Verdict::Real);
    }

    #[tokio::test]
    async fn url_input_is_replaced_with_fetched_page_text() {
        let model = StubModel::returning(
            json!({"label": "Real", "score": 0.2, "cleaned_input": "c"}),
            vec![],
        );
        let fetcher = StubFetcher {
            result: Ok(PageContent {
                title: "Some Page".to_string(),
                content: "the fetched article body".to_string(),
            }),
        };
        let req = DetectionRequest {
            input: "https://example.com/story".to_string(),
        };

        detect_fake_news(&model, &fetcher, &req).await.unwrap();
        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("the fetched article body"));
        assert!(!prompts[0].contains("https://example.com/story"));
    }

    #[tokio::test]
    async fn fetch_failure_prevents_model_invocation() {
        let model = StubModel::returning(
            json!({"label": "Real", "score": 0.2, "cleaned_input": "c"}),
            vec![],
        );
        let req = DetectionRequest {
            input: "http://example.com/broken".to_string(),
        };

        let err = detect_fake_news(&model, &failing_fetcher(), &req)
            .await
            .unwrap_err();
        assert!(err
            .to_string()
            .contains("failed to fetch content from the provided URL"));
        assert_eq!(model.calls(), 0, "model must not be invoked on fetch failure");
    }

    #[tokio::test]
    async fn malformed_output_is_a_validation_error() {
        let model = StubModel::returning(json!({"label": "Fake"}), vec![]);
        let req = DetectionRequest {
            input: "text".to_string(),
        };

        let err = detect_fake_news(&model, &failing_fetcher(), &req)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{err}");
    }

    #[tokio::test]
    async fn out_of_range_score_is_a_validation_error() {
        let model = StubModel::returning(
            json!({"label": "Fake", "score": 1.5, "cleaned_input": "c"}),
            vec![],
        );
        let req = DetectionRequest {
            input: "text".to_string(),
        };

        let err = detect_fake_news(&model, &failing_fetcher(), &req)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn unexpected_tool_name_falls_back_to_generic_reasoning() {
        let model = StubModel::returning(
            json!({"label": "Fake", "score": 0.9, "cleaned_input": "c"}),
            vec![CompletedToolCall {
                name: "some_other_tool".to_string(),
                output: json!("ignored"),
            }],
        );
        let req = DetectionRequest {
            input: "text".to_string(),
        };

        let report = detect_fake_news(&model, &failing_fetcher(), &req)
            .await
            .unwrap();
        assert_eq!(report.reasoning.as_deref(), Some(FALLBACK_FAKE_REASONING));
    }
}
