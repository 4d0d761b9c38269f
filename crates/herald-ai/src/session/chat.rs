//! Async chat turn for Session.

use tracing::{debug, warn};

use herald_common::new_correlation_id;

use crate::{AiClient, AiError, AiResponse, Message, Role};

use super::manager::Session;
use super::types::{TurnOptions, TurnPhase};

impl Session {
    /// Add a user message and get the assistant's final answer.
    ///
    /// If the model calls tools, every call is dispatched locally and the
    /// joined results are sent back in exactly one follow-up request that
    /// declares no tools. On failure the turn's history entries are rolled
    /// back and the phase returns to `AwaitingInput`. A turn whose future
    /// was dropped before finishing is rolled back at the start of the next.
    pub async fn send_turn(
        &mut self,
        client: &dyn AiClient,
        user_text: &str,
        options: &TurnOptions,
    ) -> Result<String, AiError> {
        if let Some(checkpoint) = self.open_turn.take() {
            warn!(dropped = self.messages.len().saturating_sub(checkpoint), "Previous turn was interrupted, rolling back history");
            self.messages.truncate(checkpoint);
            self.phase = TurnPhase::AwaitingInput;
        }

        let turn = new_correlation_id();
        let checkpoint = self.messages.len();
        self.open_turn = Some(checkpoint);
        self.last_path.clear();

        let result = self.run_turn(client, user_text, options, &turn).await;
        if let Err(ref e) = result {
            warn!(%turn, error = %e, "Turn failed, rolling back history");
            self.messages.truncate(checkpoint);
        }
        self.open_turn = None;
        self.phase = TurnPhase::AwaitingInput;
        result
    }

    async fn run_turn(
        &mut self,
        client: &dyn AiClient,
        user_text: &str,
        options: &TurnOptions,
        turn: &str,
    ) -> Result<String, AiError> {
        self.messages.push(Message::new(Role::User, user_text));

        let system = options.system_prompt.as_deref();
        let messages = self.build_messages(system);
        debug!(%turn, messages = messages.len(), "Calling model");
        self.advance(TurnPhase::ModelCalled);
        let response = client
            .send_message(&messages, &self.tools, &options.generation)
            .await?;
        self.record_usage(&response);

        if response.tool_calls.is_empty() {
            let answer = response.content.trim().to_string();
            self.messages.push(Message::new(Role::Assistant, answer.clone()));
            self.advance(TurnPhase::Done);
            return Ok(answer);
        }

        self.advance(TurnPhase::ToolDetected);
        debug!(%turn, calls = response.tool_calls.len(), "Model requested tools");
        self.messages
            .push(Message::new(Role::Assistant, response.content.clone()));

        let mut outputs = Vec::with_capacity(response.tool_calls.len());
        for call in &response.tool_calls {
            outputs.push(self.dispatcher.dispatch(call).await);
        }
        self.messages
            .push(Message::new(Role::Tool, outputs.join("\n")));
        self.advance(TurnPhase::ToolExecuted);

        let messages = self.build_messages(system);
        self.advance(TurnPhase::FollowupCalled);
        let followup = client
            .send_message(&messages, &[], &options.generation)
            .await?;
        self.record_usage(&followup);

        let answer = followup.content.trim().to_string();
        self.messages.push(Message::new(Role::Assistant, answer.clone()));
        self.advance(TurnPhase::Done);
        Ok(answer)
    }

    fn record_usage(&mut self, response: &AiResponse) {
        self.tracker.record(&self.provider, &response.usage);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::tools::ToolDispatcher;
    use crate::weather::{WeatherError, WeatherLookup, WeatherReport};
    use crate::{GenerationParams, TokenUsage, ToolCall, ToolDefinition};

    use super::*;

    /// Replays queued responses and records what each request carried.
    #[derive(Default)]
    struct ScriptedClient {
        replies: Mutex<VecDeque<Result<AiResponse, AiError>>>,
        requests: Mutex<Vec<(Vec<Message>, usize)>>,
    }

    impl ScriptedClient {
        fn new(replies: Vec<Result<AiResponse, AiError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl AiClient for ScriptedClient {
        async fn send_message(
            &self,
            messages: &[Message],
            tools: &[ToolDefinition],
            _params: &GenerationParams,
        ) -> Result<AiResponse, AiError> {
            self.requests
                .lock()
                .unwrap()
                .push((messages.to_vec(), tools.len()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AiError::ApiError("script exhausted".into())))
        }
    }

    #[derive(Default)]
    struct CountingWeather {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WeatherLookup for CountingWeather {
        async fn current(&self, city: &str) -> Result<WeatherReport, WeatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(WeatherReport {
                city: city.to_string(),
                temp_c: "21".into(),
                condition: "Sunny".into(),
                humidity: "50".into(),
                wind_kmph: "12".into(),
                feels_like_c: "21".into(),
            })
        }
    }

    fn text(content: &str) -> Result<AiResponse, AiError> {
        Ok(AiResponse {
            content: content.to_string(),
            tool_calls: Vec::new(),
            usage: TokenUsage {
                input_tokens: 10,
                output_tokens: 5,
            },
        })
    }

    fn tool_call(name: &str, city: &str) -> Result<AiResponse, AiError> {
        Ok(AiResponse {
            content: String::new(),
            tool_calls: vec![ToolCall {
                id: "call-1".into(),
                name: name.into(),
                arguments: serde_json::json!({ "city": city }),
            }],
            usage: TokenUsage::default(),
        })
    }

    fn session(weather: Arc<CountingWeather>) -> Session {
        Session::new("gemini", ToolDispatcher::new(weather))
    }

    #[tokio::test]
    async fn plain_answer_is_trimmed_and_recorded() {
        let client = ScriptedClient::new(vec![text("  Hello there!  \n")]);
        let mut s = session(Arc::new(CountingWeather::default()));

        let answer = s
            .send_turn(&client, "hi", &TurnOptions::default())
            .await
            .unwrap();

        assert_eq!(answer, "Hello there!");
        assert_eq!(s.message_count(), 2);
        assert_eq!(s.history()[1].content, "Hello there!");
        assert_eq!(s.phase(), TurnPhase::AwaitingInput);
        assert_eq!(s.last_turn_path(), &[TurnPhase::ModelCalled, TurnPhase::Done]);
        assert_eq!(s.tracker().total_tokens(), 15);
    }

    #[tokio::test]
    async fn weather_round_trip_uses_one_lookup_and_one_followup() {
        let client = ScriptedClient::new(vec![
            tool_call("get_weather", "Paris"),
            text("It's sunny in Paris."),
        ]);
        let weather = Arc::new(CountingWeather::default());
        let mut s = session(weather.clone());

        let answer = s
            .send_turn(&client, "Weather in Paris?", &TurnOptions::default())
            .await
            .unwrap();

        assert_eq!(answer, "It's sunny in Paris.");
        assert_eq!(weather.calls.load(Ordering::SeqCst), 1);

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].1, 1, "first call declares the weather tool");
        assert_eq!(requests[1].1, 0, "follow-up declares no tools");
        let followup_tool = requests[1]
            .0
            .iter()
            .find(|m| m.role == Role::Tool)
            .unwrap();
        assert!(followup_tool.content.starts_with("🌤️ Weather in Paris: 21°C"));

        let roles: Vec<Role> = s.history().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]
        );
        assert_eq!(
            s.last_turn_path(),
            &[
                TurnPhase::ModelCalled,
                TurnPhase::ToolDetected,
                TurnPhase::ToolExecuted,
                TurnPhase::FollowupCalled,
                TurnPhase::Done,
            ]
        );
    }

    #[tokio::test]
    async fn unknown_tool_result_is_sent_back() {
        let client = ScriptedClient::new(vec![
            tool_call("get_stock_price", "ACME"),
            text("I can't do that."),
        ]);
        let weather = Arc::new(CountingWeather::default());
        let mut s = session(weather.clone());

        let answer = s
            .send_turn(&client, "price?", &TurnOptions::default())
            .await
            .unwrap();

        assert_eq!(answer, "I can't do that.");
        assert_eq!(weather.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            s.history()[2].content,
            "Tool 'get_stock_price' not implemented."
        );
    }

    #[tokio::test]
    async fn history_stays_balanced_across_turns() {
        let client = ScriptedClient::new(vec![text("one"), text("two"), text("three")]);
        let mut s = session(Arc::new(CountingWeather::default()));

        for prompt in ["a", "b", "c"] {
            s.send_turn(&client, prompt, &TurnOptions::default())
                .await
                .unwrap();
        }

        assert_eq!(s.message_count(), 6);
        let requests = client.requests.lock().unwrap();
        assert_eq!(requests[2].0.len(), 5, "full history replayed");
    }

    #[tokio::test]
    async fn failed_turn_rolls_back_history() {
        let client = ScriptedClient::new(vec![text("first"), Err(AiError::RateLimited)]);
        let mut s = session(Arc::new(CountingWeather::default()));

        s.send_turn(&client, "one", &TurnOptions::default())
            .await
            .unwrap();
        let err = s
            .send_turn(&client, "two", &TurnOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AiError::RateLimited));
        assert_eq!(s.message_count(), 2);
        assert_eq!(s.phase(), TurnPhase::AwaitingInput);
    }

    /// Never answers its first request.
    #[derive(Default)]
    struct StallingClient {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AiClient for StallingClient {
        async fn send_message(
            &self,
            _messages: &[Message],
            _tools: &[ToolDefinition],
            _params: &GenerationParams,
        ) -> Result<AiResponse, AiError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                std::future::pending::<()>().await;
            }
            text("ok")
        }
    }

    #[tokio::test]
    async fn dropped_turn_is_rolled_back_by_the_next() {
        let client = StallingClient::default();
        let mut s = session(Arc::new(CountingWeather::default()));

        let dropped = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            s.send_turn(&client, "one", &TurnOptions::default()),
        )
        .await;
        assert!(dropped.is_err());
        assert_eq!(s.message_count(), 1, "user entry left behind by the drop");

        let answer = s
            .send_turn(&client, "two", &TurnOptions::default())
            .await
            .unwrap();
        assert_eq!(answer, "ok");
        let contents: Vec<&str> = s.history().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["two", "ok"]);
        assert_eq!(s.phase(), TurnPhase::AwaitingInput);
    }

    #[tokio::test]
    async fn failed_followup_rolls_back_tool_entries() {
        let client = ScriptedClient::new(vec![
            tool_call("get_weather", "Oslo"),
            Err(AiError::Timeout),
        ]);
        let mut s = session(Arc::new(CountingWeather::default()));

        let err = s
            .send_turn(&client, "Oslo weather", &TurnOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AiError::Timeout));
        assert_eq!(s.message_count(), 0);
    }

    #[tokio::test]
    async fn system_prompt_is_sent_but_not_stored() {
        let client = ScriptedClient::new(vec![text("ok")]);
        let mut s = session(Arc::new(CountingWeather::default()));
        let opts = TurnOptions::default().with_system_prompt("You are terse.");

        s.send_turn(&client, "hi", &opts).await.unwrap();

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests[0].0[0].role, Role::System);
        assert!(s.history().iter().all(|m| m.role != Role::System));
    }
}
