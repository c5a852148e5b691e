//! Deterministic substitute text for an unavailable upstream.

use chrono::Utc;
use config::FallbackConfig;
use relay_core::{CompletionRequest, CompletionResponse, MockStrategy, Usage};
use strum::{Display, EnumIter, IntoEnumIterator};

/// Model name carried by every synthesized response.
pub const MOCK_MODEL: &str = "fallback-mock";

/// Largest `max_tokens` honoured when sizing mock text.
pub const MOCK_TOKEN_CEILING: u32 = 8_192;

/// Prompt categories, checked in declaration order; `Default` matches
/// anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum MockCategory {
    Abstract,
    Question,
    Introduction,
    Methodology,
    Conclusion,
    Default
}

impl MockCategory {
    pub fn classify(prompt: &str) -> Self {
        let prompt = prompt.to_lowercase();
        MockCategory::iter()
            .find(|category| {
                *category == MockCategory::Default || prompt.contains(&category.to_string())
            })
            .unwrap_or(MockCategory::Default)
    }

    fn sentences(self) -> &'static [&'static str] {
        match self {
            MockCategory::Abstract => &[
                "This study investigates the impact of emerging technologies on modern educational practices.",
                "Through a mixed-methods approach combining quantitative analysis and qualitative interviews, we examined factors influencing student engagement and learning outcomes.",
                "Findings suggest that technology integration, when coupled with pedagogical innovation, significantly enhances educational effectiveness."
            ],
            MockCategory::Question => &[
                "What are the key methodological considerations in your research design?",
                "How does your approach contribute to existing literature in this field?",
                "Can you elaborate on the limitations of your study and future research directions?"
            ],
            MockCategory::Introduction => &[
                "The rapid advancement of digital technologies has fundamentally transformed how we approach research and knowledge dissemination.",
                "In contemporary academic contexts, understanding the intersections between innovation, methodology, and practical application has become increasingly essential.",
                "This research explores these dimensions through a comprehensive examination of current practices and emerging trends."
            ],
            MockCategory::Methodology => &[
                "This study employed a mixed-methods research design, integrating both quantitative and qualitative approaches.",
                "Data collection involved surveys administered to 500 participants, supplemented by 30 in-depth interviews.",
                "Analysis was conducted using SPSS for quantitative data and thematic coding for qualitative findings."
            ],
            MockCategory::Conclusion => &[
                "Our findings demonstrate the importance of integrated approaches in addressing complex research questions.",
                "The results suggest significant implications for policy and practice, particularly in how institutions adapt to rapidly changing environments.",
                "Further investigation is warranted to explore long-term effects and broader applicability."
            ],
            MockCategory::Default => &[
                "This is a comprehensive response to your query.",
                "The analysis reveals important patterns and relationships that contribute meaningfully to our understanding of this topic.",
                "These findings have implications for theory, practice, and future research directions in this field."
            ]
        }
    }
}

/// Keyword-classified canned text padded towards a share of `max_tokens`.
///
/// Padding repeats the category's sentences round-robin, so the same
/// request always yields the same text.
#[derive(Debug, Clone)]
pub struct TemplateMockStrategy {
    fill_ratio: f64,
    default_max_tokens: u32
}

impl TemplateMockStrategy {
    pub fn new(fill_ratio: f64, default_max_tokens: u32) -> Self {
        Self {
            fill_ratio,
            default_max_tokens
        }
    }

    pub fn from_config(config: &FallbackConfig) -> Self {
        Self::new(config.mock_fill_ratio, config.default_max_tokens)
    }

    /// Words to reach for `max_tokens`, clamped to [`MOCK_TOKEN_CEILING`].
    pub fn target_words(&self, max_tokens: Option<u32>) -> usize {
        let max_tokens = max_tokens
            .unwrap_or(self.default_max_tokens)
            .min(MOCK_TOKEN_CEILING);
        (f64::from(max_tokens) * self.fill_ratio).ceil() as usize
    }

    pub fn expand(&self, category: MockCategory, max_tokens: Option<u32>) -> String {
        let sentences = category.sentences();
        let target = self.target_words(max_tokens);

        let mut text = sentences.join(" ");
        let mut words = utils::word_count(&text);
        for sentence in sentences.iter().cycle() {
            if words >= target {
                break;
            }
            text.push(' ');
            text.push_str(sentence);
            words += utils::word_count(sentence);
        }
        text
    }
}

impl Default for TemplateMockStrategy {
    fn default() -> Self {
        Self::from_config(&FallbackConfig::default())
    }
}

impl MockStrategy for TemplateMockStrategy {
    fn synthesize(&self, request: &CompletionRequest) -> Option<String> {
        let category = MockCategory::classify(&request.prompt);
        tracing::debug!(%category, "Synthesizing mock completion");
        Some(self.expand(category, request.max_tokens))
    }
}

/// Never substitutes; upstream errors always reach the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMockStrategy;

impl MockStrategy for NoMockStrategy {
    fn synthesize(&self, _request: &CompletionRequest) -> Option<String> {
        None
    }
}

/// Wrap synthesized text in a response marked with [`MOCK_MODEL`].
pub fn mock_response(request: &CompletionRequest, text: String) -> CompletionResponse {
    let usage = Usage::new(
        utils::word_count(&request.prompt) as u32,
        utils::word_count(&text) as u32
    );
    CompletionResponse {
        id: utils::generate_id("fallback"),
        text,
        model: MOCK_MODEL.to_string(),
        usage: Some(usage),
        timestamp: Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_order() {
        assert_eq!(
            MockCategory::classify("Write an ABSTRACT and a conclusion"),
            MockCategory::Abstract
        );
        assert_eq!(
            MockCategory::classify("one question about the methodology"),
            MockCategory::Question
        );
        assert_eq!(
            MockCategory::classify("Draft the introduction"),
            MockCategory::Introduction
        );
        assert_eq!(
            MockCategory::classify("methodology section"),
            MockCategory::Methodology
        );
        assert_eq!(MockCategory::classify("final conclusion"), MockCategory::Conclusion);
        assert_eq!(MockCategory::classify("tell me a joke"), MockCategory::Default);
    }

    #[test]
    fn test_padding_reaches_target() {
        let strategy = TemplateMockStrategy::new(0.7, 2048);
        let text = strategy.expand(MockCategory::Abstract, Some(200));

        let words = utils::word_count(&text);
        assert!(words >= 140);
        let longest = MockCategory::Abstract
            .sentences()
            .iter()
            .map(|s| utils::word_count(s))
            .max()
            .unwrap();
        assert!(words < 140 + longest);
    }

    #[test]
    fn test_short_target_keeps_base_template() {
        let strategy = TemplateMockStrategy::new(0.7, 2048);
        let text = strategy.expand(MockCategory::Default, Some(4));
        assert_eq!(text, MockCategory::Default.sentences().join(" "));
    }

    #[test]
    fn test_deterministic() {
        let strategy = TemplateMockStrategy::default();
        let request = CompletionRequest::new("methodology please").with_max_tokens(300);
        assert_eq!(strategy.synthesize(&request), strategy.synthesize(&request));
    }

    #[test]
    fn test_default_max_tokens() {
        let strategy = TemplateMockStrategy::default();
        assert_eq!(strategy.target_words(None), 1434);
    }

    #[test]
    fn test_huge_max_tokens_is_clamped() {
        let strategy = TemplateMockStrategy::new(0.7, 2048);
        assert_eq!(strategy.target_words(Some(u32::MAX)), 5735);

        let request = CompletionRequest::new("any conclusion").with_max_tokens(u32::MAX);
        let text = strategy.synthesize(&request).unwrap();
        assert!(utils::word_count(&text) < 6_000);
    }

    #[test]
    fn test_default_template_text() {
        let text = MockCategory::Default.sentences().join(" ");
        assert!(text.starts_with("This is a comprehensive response to your query."));
    }

    #[test]
    fn test_mock_response_shape() {
        let request = CompletionRequest::new("two words");
        let response = mock_response(&request, "a b c".to_string());

        assert_eq!(response.model, MOCK_MODEL);
        assert!(response.id.starts_with("fallback-"));
        assert_eq!(response.usage, Some(Usage::new(2, 3)));
    }

    #[test]
    fn test_no_mock_strategy() {
        assert_eq!(NoMockStrategy.synthesize(&CompletionRequest::new("x")), None);
    }
}
