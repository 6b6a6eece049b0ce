//! The staged validation pipeline

use crate::{
    format::check_format,
    providers::{ChatCompletionRequest, ChatMessage, ProviderError},
    OpenAiClient, ProbeError, ProviderApi, Result, RunReport, Stage, StageRecord, StageResult,
    ValidatorConfig, DEFAULT_MODEL,
};
use logger_redacted::{redacted_info, redacted_warn, RedactionConfig, SecretRedactor};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Receives progress while a run executes
///
/// Both methods default to no-ops, and `()` implements the trait for callers
/// that only want the final report.
pub trait StageObserver {
    fn stage_started(&mut self, _stage: Stage) {}

    fn stage_finished(&mut self, _record: &StageRecord) {}
}

impl StageObserver for () {}

/// Runs the four validation stages against one provider
pub struct Validator {
    config: ValidatorConfig,
    provider: Arc<dyn ProviderApi>,
    redactor: SecretRedactor,
}

impl Validator {
    /// Build a validator talking to the configured OpenAI-compatible endpoint
    pub fn new(config: ValidatorConfig) -> Result<Self> {
        config.validate()?;
        let provider = OpenAiClient::new(&config)?;
        Ok(Self::with_provider(config, Arc::new(provider)))
    }

    /// Build a validator around any provider implementation
    pub fn with_provider(config: ValidatorConfig, provider: Arc<dyn ProviderApi>) -> Self {
        let redactor = SecretRedactor::new(
            RedactionConfig::default()
                .with_hash_for_correlation(false)
                .with_secret(config.credential_str()),
        );

        Self {
            config,
            provider,
            redactor,
        }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Run every stage and return the report
    pub async fn run(&self) -> RunReport {
        self.run_with(&mut ()).await
    }

    /// Run every stage, notifying `observer` as each one starts and finishes
    pub async fn run_with<O: StageObserver>(&self, observer: &mut O) -> RunReport {
        self.run_until(std::future::pending::<()>(), observer).await
    }

    /// Run every stage until `shutdown` resolves
    ///
    /// The stage in flight when `shutdown` fires is dropped and not recorded;
    /// the returned report is marked interrupted.
    pub async fn run_until<F, O>(&self, shutdown: F, observer: &mut O) -> RunReport
    where
        F: Future<Output = ()>,
        O: StageObserver,
    {
        tokio::pin!(shutdown);
        let mut report = RunReport::new();

        for stage in Stage::ALL {
            info!(step = stage.step(), stage = %stage, "Running stage");
            observer.stage_started(stage);
            let started = Instant::now();

            let result = tokio::select! {
                biased;
                () = &mut shutdown => {
                    warn!(stage = %stage, "Validation interrupted");
                    report.mark_interrupted();
                    break;
                }
                result = self.execute(stage) => result,
            };

            let record = StageRecord {
                stage,
                result,
                latency_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            };

            match &record.result {
                StageResult::Passed { detail } => {
                    redacted_info!(self.redactor, "Stage {stage} passed: {detail}");
                }
                StageResult::Failed { error } => {
                    redacted_warn!(self.redactor, "Stage {stage} failed: {error}");
                }
            }

            observer.stage_finished(&record);
            let abort = stage.is_fatal_gate() && !record.result.is_passed();
            report.record(record);

            if abort {
                debug!(stage = %stage, "Fatal gate failed, skipping remaining stages");
                break;
            }
        }

        report
    }

    async fn execute(&self, stage: Stage) -> StageResult {
        let result = match stage {
            Stage::Format => self.check_format(),
            Stage::Connectivity => self.check_connectivity().await,
            Stage::ModelAvailability => self.check_model_availability().await,
            Stage::Completion => self.check_completion().await,
        };
        self.scrub(result)
    }

    fn check_format(&self) -> StageResult {
        match check_format(Some(self.config.credential_str())) {
            Ok(()) => StageResult::passed("API key format looks valid."),
            Err(error) => StageResult::failed(error),
        }
    }

    async fn check_connectivity(&self) -> StageResult {
        match self.provider.list_models().await {
            Ok(()) => StageResult::passed("Successfully connected to the API."),
            Err(error) => StageResult::failed(connectivity_failure(error)),
        }
    }

    async fn check_model_availability(&self) -> StageResult {
        let requested = self.config.model_id.as_str();

        match self.provider.retrieve_model(requested).await {
            Ok(model) => StageResult::passed(format!("Model {} is available.", model.id)),
            Err(error) if error.is_not_found() => {
                let unavailable = ProbeError::ModelUnavailable {
                    requested: requested.to_string(),
                    fallback: DEFAULT_MODEL.to_string(),
                };

                if requested == DEFAULT_MODEL {
                    return StageResult::failed(unavailable);
                }

                warn!(model = %requested, fallback = DEFAULT_MODEL, "Model not found, trying fallback");
                match self.provider.retrieve_model(DEFAULT_MODEL).await {
                    Ok(model) => StageResult::passed(format!(
                        "Model {requested} not found; fallback model {} is available.",
                        model.id
                    )),
                    Err(fallback_error) => {
                        debug!(error = %fallback_error, "Fallback lookup failed");
                        StageResult::failed(unavailable)
                    }
                }
            }
            Err(error) => StageResult::failed(ProbeError::LookupError {
                message: error.to_string(),
            }),
        }
    }

    async fn check_completion(&self) -> StageResult {
        let request = ChatCompletionRequest {
            model: self.config.model_id.clone(),
            messages: vec![ChatMessage::user(self.config.prompt.clone())],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        match self.provider.create_chat_completion(&request).await {
            Ok(completion) => match completion.first_text() {
                Some(text) => StageResult::passed(format!("Response: {text}")),
                None => StageResult::failed(ProbeError::EmptyResponse),
            },
            Err(error) => StageResult::failed(completion_failure(error)),
        }
    }

    /// Remove the credential and other secrets from recorded diagnostics
    fn scrub(&self, result: StageResult) -> StageResult {
        match result {
            StageResult::Passed { detail } => StageResult::Passed {
                detail: self.redactor.redact(&detail),
            },
            StageResult::Failed { error } => StageResult::Failed {
                error: self.scrub_error(error),
            },
        }
    }

    fn scrub_error(&self, error: ProbeError) -> ProbeError {
        let redact = |text: String| self.redactor.redact(&text);
        match error {
            ProbeError::UnexpectedStatus { code, body } => ProbeError::UnexpectedStatus {
                code,
                body: redact(body),
            },
            ProbeError::ConnectionError { message } => ProbeError::ConnectionError {
                message: redact(message),
            },
            ProbeError::UnknownTransportError { message } => ProbeError::UnknownTransportError {
                message: redact(message),
            },
            ProbeError::LookupError { message } => ProbeError::LookupError {
                message: redact(message),
            },
            ProbeError::ProviderError { message } => ProbeError::ProviderError {
                message: redact(message),
            },
            ProbeError::UnknownError { message } => ProbeError::UnknownError {
                message: redact(message),
            },
            other => other,
        }
    }
}

fn connectivity_failure(error: ProviderError) -> ProbeError {
    match error {
        ProviderError::Status { code: 401, .. } => ProbeError::AuthenticationFailed,
        ProviderError::Status { code: 403, .. } => ProbeError::Forbidden,
        ProviderError::Status { code, body, .. } => ProbeError::UnexpectedStatus { code, body },
        ProviderError::Timeout => ProbeError::Timeout,
        ProviderError::Connect(message) => ProbeError::ConnectionError { message },
        ProviderError::Decode(message) | ProviderError::Transport(message) => {
            ProbeError::UnknownTransportError { message }
        }
    }
}

fn completion_failure(error: ProviderError) -> ProbeError {
    match error {
        ProviderError::Status { code: 401, .. } => ProbeError::AuthenticationFailed,
        ProviderError::Status { code: 429, .. } => ProbeError::RateLimited,
        error @ (ProviderError::Status { .. } | ProviderError::Timeout | ProviderError::Connect(_)) => {
            ProbeError::ProviderError {
                message: error.to_string(),
            }
        }
        error @ (ProviderError::Decode(_) | ProviderError::Transport(_)) => ProbeError::UnknownError {
            message: error.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ChatChoice, ChatCompletion, MockProviderApi, ModelInfo};
    use std::time::Duration;

    const VALID_KEY: &str = "sk-test-0123456789abcdefghij";

    fn config() -> ValidatorConfig {
        ValidatorConfig::default().with_credential(VALID_KEY)
    }

    fn validator(config: ValidatorConfig, mock: MockProviderApi) -> Validator {
        Validator::with_provider(config, Arc::new(mock))
    }

    fn status(code: u16, body: &str) -> ProviderError {
        ProviderError::Status {
            code,
            body: body.to_string(),
            message: body.to_string(),
        }
    }

    fn model(id: &str) -> ModelInfo {
        ModelInfo {
            id: id.to_string(),
            owned_by: Some("openai".to_string()),
            created: None,
        }
    }

    fn completion(text: &str) -> ChatCompletion {
        ChatCompletion {
            id: Some("chatcmpl-1".to_string()),
            model: Some(DEFAULT_MODEL.to_string()),
            choices: vec![ChatChoice {
                index: 0,
                message: Some(ChatMessage {
                    role: "assistant".to_string(),
                    content: Some(text.to_string()),
                }),
                finish_reason: Some("stop".to_string()),
            }],
        }
    }

    fn healthy_mock() -> MockProviderApi {
        let mut mock = MockProviderApi::new();
        mock.expect_list_models().times(1).returning(|| Ok(()));
        mock.expect_retrieve_model()
            .withf(|id| id == DEFAULT_MODEL)
            .times(1)
            .returning(|id| Ok(model(id)));
        mock.expect_create_chat_completion()
            .times(1)
            .returning(|_| Ok(completion("API test successful")));
        mock
    }

    fn assert_invariant(report: &RunReport) {
        let stages = report.stages();
        let expected: Vec<Stage> = Stage::ALL.into_iter().take(stages.len()).collect();
        assert_eq!(stages, expected, "report must be a prefix of the pipeline");

        let gate_failure = report
            .entries()
            .iter()
            .position(|e| e.stage.is_fatal_gate() && !e.result.is_passed());
        if let Some(position) = gate_failure {
            assert_eq!(position + 1, report.len(), "nothing may follow a failed gate");
        }
    }

    #[tokio::test]
    async fn test_missing_credential_stops_before_network() {
        // No expectations: any provider call panics the mock.
        let validator = validator(ValidatorConfig::default(), MockProviderApi::new());

        let report = validator.run().await;

        assert_eq!(report.len(), 1);
        assert_eq!(
            report.get(Stage::Format),
            Some(&StageResult::failed(ProbeError::MissingCredential))
        );
        assert_invariant(&report);
    }

    #[tokio::test]
    async fn test_invalid_prefix_makes_no_network_call() {
        for key in ["pk-0123456789abcdefghijklmno", "0123456789abcdefghijklmnop", "Bearer sk-0123456789abcdefg"] {
            let validator = validator(ValidatorConfig::default().with_credential(key), MockProviderApi::new());

            let report = validator.run().await;

            assert_eq!(report.len(), 1);
            assert!(matches!(
                report.get(Stage::Format).and_then(StageResult::error),
                Some(ProbeError::InvalidPrefix { .. })
            ));
            assert_invariant(&report);
        }
    }

    #[tokio::test]
    async fn test_short_credential_fails_format() {
        let validator = validator(
            ValidatorConfig::default().with_credential("sk-abc123"),
            MockProviderApi::new(),
        );

        let report = validator.run().await;

        assert_eq!(report.len(), 1);
        assert!(matches!(
            report.get(Stage::Format).and_then(StageResult::error),
            Some(ProbeError::TooShort { length: 9, minimum: 20 })
        ));
    }

    #[tokio::test]
    async fn test_connectivity_status_mapping() {
        let cases = [
            (status(401, "unauthorized"), ProbeError::AuthenticationFailed),
            (status(403, "forbidden"), ProbeError::Forbidden),
            (
                status(500, "server exploded"),
                ProbeError::UnexpectedStatus {
                    code: 500,
                    body: "server exploded".to_string(),
                },
            ),
            (ProviderError::Timeout, ProbeError::Timeout),
            (
                ProviderError::Connect("dns error".to_string()),
                ProbeError::ConnectionError {
                    message: "dns error".to_string(),
                },
            ),
            (
                ProviderError::Transport("broken pipe".to_string()),
                ProbeError::UnknownTransportError {
                    message: "broken pipe".to_string(),
                },
            ),
        ];

        for (provider_error, expected) in cases {
            let mut mock = MockProviderApi::new();
            mock.expect_list_models()
                .times(1)
                .returning(move || Err(provider_error.clone()));
            let validator = validator(config(), mock);

            let report = validator.run().await;

            assert_eq!(report.len(), 2, "connectivity failure must abort the pipeline");
            assert!(report.get(Stage::Format).is_some_and(StageResult::is_passed));
            assert_eq!(report.get(Stage::Connectivity), Some(&StageResult::failed(expected)));
            assert!(report.get(Stage::ModelAvailability).is_none());
            assert!(report.get(Stage::Completion).is_none());
            assert_invariant(&report);
        }
    }

    #[tokio::test]
    async fn test_full_success() {
        let validator = validator(config(), healthy_mock());

        let report = validator.run().await;

        assert_eq!(report.len(), 4);
        assert!(report.entries().iter().all(|e| e.result.is_passed()));
        assert_eq!(report.summary().outcome, crate::Outcome::AllPassed);
        assert_eq!(
            report.get(Stage::Completion),
            Some(&StageResult::passed("Response: API test successful"))
        );
        assert!(!report.was_interrupted());
    }

    #[tokio::test]
    async fn test_model_fallback_is_used_and_completion_still_runs() {
        let mut mock = MockProviderApi::new();
        mock.expect_list_models().times(1).returning(|| Ok(()));
        mock.expect_retrieve_model()
            .withf(|id| id == "gpt-imaginary")
            .times(1)
            .returning(|_| Err(status(404, "model not found")));
        mock.expect_retrieve_model()
            .withf(|id| id == DEFAULT_MODEL)
            .times(1)
            .returning(|id| Ok(model(id)));
        mock.expect_create_chat_completion()
            .withf(|request| request.model == "gpt-imaginary" && request.max_tokens == 50)
            .times(1)
            .returning(|_| Ok(completion("hi")));

        let validator = validator(config().with_model("gpt-imaginary"), mock);
        let report = validator.run().await;

        let availability = report.get(Stage::ModelAvailability).unwrap();
        assert!(availability.is_passed());
        assert!(availability.detail().contains("fallback model gpt-3.5-turbo"));
        assert_eq!(report.len(), 4);
    }

    #[tokio::test]
    async fn test_model_and_fallback_missing_is_non_fatal() {
        let mut mock = MockProviderApi::new();
        mock.expect_list_models().times(1).returning(|| Ok(()));
        mock.expect_retrieve_model()
            .times(2)
            .returning(|_| Err(status(404, "model not found")));
        mock.expect_create_chat_completion()
            .times(1)
            .returning(|_| Err(status(404, "model not found")));

        let validator = validator(config().with_model("gpt-imaginary"), mock);
        let report = validator.run().await;

        assert_eq!(report.len(), 4);
        assert_eq!(
            report.get(Stage::ModelAvailability),
            Some(&StageResult::failed(ProbeError::ModelUnavailable {
                requested: "gpt-imaginary".to_string(),
                fallback: DEFAULT_MODEL.to_string(),
            }))
        );
        assert_eq!(report.summary().outcome, crate::Outcome::PartialPass);
    }

    #[tokio::test]
    async fn test_fallback_lookup_error_counts_as_unavailable() {
        let mut mock = MockProviderApi::new();
        mock.expect_list_models().returning(|| Ok(()));
        mock.expect_retrieve_model()
            .withf(|id| id == "gpt-imaginary")
            .returning(|_| Err(status(404, "nope")));
        mock.expect_retrieve_model()
            .withf(|id| id == DEFAULT_MODEL)
            .returning(|_| Err(ProviderError::Timeout));
        mock.expect_create_chat_completion()
            .returning(|_| Ok(completion("ok")));

        let validator = validator(config().with_model("gpt-imaginary"), mock);
        let report = validator.run().await;

        assert!(matches!(
            report.get(Stage::ModelAvailability).and_then(StageResult::error),
            Some(ProbeError::ModelUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_default_model_not_found_skips_redundant_fallback() {
        let mut mock = MockProviderApi::new();
        mock.expect_list_models().returning(|| Ok(()));
        mock.expect_retrieve_model()
            .times(1)
            .returning(|_| Err(status(404, "nope")));
        mock.expect_create_chat_completion()
            .returning(|_| Ok(completion("ok")));

        let validator = validator(config(), mock);
        let report = validator.run().await;

        assert!(matches!(
            report.get(Stage::ModelAvailability).and_then(StageResult::error),
            Some(ProbeError::ModelUnavailable { .. })
        ));
    }

    #[tokio::test]
    async fn test_lookup_error_other_than_not_found() {
        let mut mock = MockProviderApi::new();
        mock.expect_list_models().returning(|| Ok(()));
        mock.expect_retrieve_model()
            .times(1)
            .returning(|_| Err(status(500, "lookup broke")));
        mock.expect_create_chat_completion()
            .times(1)
            .returning(|_| Ok(completion("ok")));

        let validator = validator(config(), mock);
        let report = validator.run().await;

        assert_eq!(
            report.get(Stage::ModelAvailability),
            Some(&StageResult::failed(ProbeError::LookupError {
                message: "HTTP 500: lookup broke".to_string(),
            }))
        );
        assert!(report.get(Stage::Completion).is_some_and(StageResult::is_passed));
    }

    #[tokio::test]
    async fn test_completion_failure_mapping() {
        let cases: Vec<(std::result::Result<ChatCompletion, ProviderError>, ProbeError)> = vec![
            (
                Ok(ChatCompletion {
                    id: None,
                    model: None,
                    choices: vec![],
                }),
                ProbeError::EmptyResponse,
            ),
            (Ok(completion("   ")), ProbeError::EmptyResponse),
            (Err(status(401, "bad key")), ProbeError::AuthenticationFailed),
            (Err(status(429, "slow down")), ProbeError::RateLimited),
            (
                Err(status(400, "max_tokens is too large")),
                ProbeError::ProviderError {
                    message: "HTTP 400: max_tokens is too large".to_string(),
                },
            ),
            (
                Err(ProviderError::Timeout),
                ProbeError::ProviderError {
                    message: "request timed out".to_string(),
                },
            ),
            (
                Err(ProviderError::Decode("expected value".to_string())),
                ProbeError::UnknownError {
                    message: "invalid response body: expected value".to_string(),
                },
            ),
        ];

        for (response, expected) in cases {
            let mut mock = MockProviderApi::new();
            mock.expect_list_models().returning(|| Ok(()));
            mock.expect_retrieve_model().returning(|id| Ok(model(id)));
            mock.expect_create_chat_completion()
                .times(1)
                .returning(move |_| response.clone());

            let validator = validator(config(), mock);
            let report = validator.run().await;

            assert_eq!(report.len(), 4);
            assert_eq!(report.get(Stage::Completion), Some(&StageResult::failed(expected)));
            assert_eq!(report.summary().outcome, crate::Outcome::PartialPass);
        }
    }

    #[tokio::test]
    async fn test_credential_is_scrubbed_from_diagnostics() {
        let mut mock = MockProviderApi::new();
        mock.expect_list_models()
            .returning(|| Err(status(418, &format!("token {VALID_KEY} rejected"))));

        let validator = validator(config(), mock);
        let report = validator.run().await;

        let detail = report.get(Stage::Connectivity).unwrap().detail();
        assert!(!detail.contains(VALID_KEY), "diagnostic leaked the key: {detail}");
        assert!(detail.contains("418"));
    }

    #[tokio::test]
    async fn test_runs_are_idempotent() {
        let validator = validator(config().with_model("gpt-imaginary"), {
            let mut mock = MockProviderApi::new();
            mock.expect_list_models().times(2).returning(|| Ok(()));
            mock.expect_retrieve_model()
                .withf(|id| id == "gpt-imaginary")
                .times(2)
                .returning(|_| Err(status(404, "missing")));
            mock.expect_retrieve_model()
                .withf(|id| id == DEFAULT_MODEL)
                .times(2)
                .returning(|id| Ok(model(id)));
            mock.expect_create_chat_completion()
                .times(2)
                .returning(|_| Err(status(429, "slow down")));
            mock
        });

        let first = validator.run().await;
        let second = validator.run().await;

        let contents = |report: &RunReport| {
            report
                .entries()
                .iter()
                .map(|e| (e.stage, e.result.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(contents(&first), contents(&second));
        assert_eq!(first.summary(), second.summary());
    }

    #[derive(Default)]
    struct Recorder {
        started: Vec<Stage>,
        finished: Vec<Stage>,
    }

    impl StageObserver for Recorder {
        fn stage_started(&mut self, stage: Stage) {
            self.started.push(stage);
        }

        fn stage_finished(&mut self, record: &StageRecord) {
            self.finished.push(record.stage);
        }
    }

    #[tokio::test]
    async fn test_observer_sees_each_stage_as_it_completes() {
        let validator = validator(config(), healthy_mock());
        let mut recorder = Recorder::default();

        let report = validator.run_with(&mut recorder).await;

        assert_eq!(recorder.started, Stage::ALL.to_vec());
        assert_eq!(recorder.finished, report.stages());
    }

    #[tokio::test]
    async fn test_interrupt_before_first_stage() {
        let validator = validator(config(), MockProviderApi::new());
        let mut recorder = Recorder::default();

        let report = validator.run_until(std::future::ready(()), &mut recorder).await;

        assert!(report.was_interrupted());
        assert!(report.is_empty());
        assert!(recorder.finished.is_empty());
    }

    /// Provider whose completion call never returns
    struct StalledCompletion;

    #[async_trait::async_trait]
    impl ProviderApi for StalledCompletion {
        async fn list_models(&self) -> crate::providers::ProviderResult<()> {
            Ok(())
        }

        async fn retrieve_model(&self, model_id: &str) -> crate::providers::ProviderResult<ModelInfo> {
            Ok(model(model_id))
        }

        async fn create_chat_completion(
            &self,
            _request: &ChatCompletionRequest,
        ) -> crate::providers::ProviderResult<ChatCompletion> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_interrupt_mid_stage_keeps_partial_report() {
        let validator = Validator::with_provider(config(), Arc::new(StalledCompletion));

        let report = validator
            .run_until(tokio::time::sleep(Duration::from_millis(50)), &mut ())
            .await;

        assert!(report.was_interrupted());
        assert_eq!(
            report.stages(),
            vec![Stage::Format, Stage::Connectivity, Stage::ModelAvailability]
        );
        assert!(report.get(Stage::Completion).is_none());
        assert_eq!(report.summary().outcome, crate::Outcome::AllPassed);
        assert_invariant(&report);
    }
}
