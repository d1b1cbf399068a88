#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
    use chrono_tz::Tz;
    use mockall::Sequence;
    use tailortalk_gcal::logic::ScheduleSettings;
    use tailortalk_gcal::service::mock::MockCalendarService;

    use crate::agent::{AgentError, CalendarAgent};
    use crate::llm::{ChatMessage, FunctionCall, MockChatModel, ModelReply, ToolCall};
    use crate::tools::CalendarContext;

    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 7, 6)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn context(service: MockCalendarService) -> CalendarContext {
        CalendarContext::new(Arc::new(service), Arc::new(ScheduleSettings::default()))
            .with_clock(fixed_now)
    }

    fn tool_call(id: &str, name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            kind: "function".to_string(),
            function: FunctionCall {
                name: name.to_string(),
                arguments: arguments.to_string(),
            },
        }
    }

    fn tool_output(message: &ChatMessage) -> Option<&str> {
        match message {
            ChatMessage::Tool { content, .. } => Some(content.as_str()),
            _ => None,
        }
    }

    #[test]
    fn test_system_prompt_mentions_now_and_zone() {
        let agent = CalendarAgent::new(Arc::new(MockChatModel::new()), context(MockCalendarService::new()));
        let prompt = agent.system_prompt(fixed_now());

        assert!(prompt.contains("2025-07-06T08:00:00 (Sunday)"));
        assert!(prompt.contains("Asia/Kolkata"));
        assert!(prompt.contains("book_meeting"));
        assert_eq!(agent.tools().len(), 3);
    }

    #[tokio::test]
    async fn test_plain_answer_needs_one_completion() {
        let mut model = MockChatModel::new();
        model
            .expect_complete()
            .withf(|messages, tools| {
                messages.len() == 2
                    && matches!(&messages[0], ChatMessage::System { content } if content.contains("2025-07-06"))
                    && messages[1] == ChatMessage::user("hello")
                    && tools.len() == 3
            })
            .times(1)
            .returning(|_, _| Ok(ModelReply::Text("Hi! How can I help?".to_string())));

        let agent = CalendarAgent::new(Arc::new(model), context(MockCalendarService::new()));
        assert_eq!(agent.run("hello").await.unwrap(), "Hi! How can I help?");
    }

    #[tokio::test]
    async fn test_tool_result_is_fed_back() {
        let start = Tz::Asia__Kolkata
            .with_ymd_and_hms(2025, 7, 7, 10, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let end = Tz::Asia__Kolkata
            .with_ymd_and_hms(2025, 7, 7, 11, 0, 0)
            .unwrap()
            .with_timezone(&Utc);
        let service = MockCalendarService::new().with_event("primary", "Standup", start, end);

        let mut seq = Sequence::new();
        let mut model = MockChatModel::new();
        model
            .expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(ModelReply::ToolCalls {
                    content: None,
                    calls: vec![tool_call("call_1", "check_calendar", r#"{"date":"tomorrow"}"#)],
                })
            });
        model
            .expect_complete()
            .withf(|messages, _| {
                messages.len() == 4
                    && matches!(&messages[2], ChatMessage::Assistant { tool_calls, .. } if tool_calls.len() == 1)
                    && matches!(
                        &messages[3],
                        ChatMessage::Tool { tool_call_id, name, content }
                            if tool_call_id == "call_1"
                                && name == "check_calendar"
                                && content == "⏰ You're busy during: 10:00 → 11:00"
                    )
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(ModelReply::Text("You have a standup at 10.".to_string())));

        let agent = CalendarAgent::new(Arc::new(model), context(service));
        let answer = agent.run("What's on tomorrow?").await.unwrap();
        assert_eq!(answer, "You have a standup at 10.");
    }

    #[tokio::test]
    async fn test_bad_tool_calls_are_reported_to_model() {
        let mut seq = Sequence::new();
        let mut model = MockChatModel::new();
        model
            .expect_complete()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(ModelReply::ToolCalls {
                    content: Some("Let me look.".to_string()),
                    calls: vec![
                        tool_call("a", "delete_everything", "{}"),
                        tool_call("b", "check_calendar", "{not json"),
                    ],
                })
            });
        model
            .expect_complete()
            .withf(|messages, _| {
                let outputs: Vec<&str> = messages.iter().filter_map(tool_output).collect();
                outputs.len() == 2
                    && outputs[0].starts_with("⚠️ Unknown tool 'delete_everything'")
                    && outputs[1].starts_with("⚠️ Invalid arguments for 'check_calendar'")
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(ModelReply::Text("Sorry, could you rephrase?".to_string())));

        let agent = CalendarAgent::new(Arc::new(model), context(MockCalendarService::new()));
        assert_eq!(
            agent.run("wipe my week").await.unwrap(),
            "Sorry, could you rephrase?"
        );
    }

    #[tokio::test]
    async fn test_iteration_limit() {
        let mut model = MockChatModel::new();
        model.expect_complete().times(2).returning(|_, _| {
            Ok(ModelReply::ToolCalls {
                content: None,
                calls: vec![tool_call("loop", "check_calendar", r#"{"date":"today"}"#)],
            })
        });

        let agent = CalendarAgent::new(Arc::new(model), context(MockCalendarService::new()))
            .with_max_iterations(2);
        let err = agent.run("keep checking").await.unwrap_err();
        assert!(matches!(err, AgentError::IterationLimit(2)));
        assert_eq!(err.to_string(), "No answer after 2 steps");
    }

    #[tokio::test]
    async fn test_model_errors_propagate() {
        let mut model = MockChatModel::new();
        model.expect_complete().times(1).returning(|_, _| {
            Err(AgentError::Api {
                status: 401,
                body: "unauthorized".to_string(),
            })
        });

        let agent = CalendarAgent::new(Arc::new(model), context(MockCalendarService::new()));
        let err = agent.run("hello").await.unwrap_err();
        assert_eq!(err.to_string(), "LLM API returned 401: unauthorized");
    }

    #[tokio::test]
    async fn test_zero_iterations_still_asks_once() {
        let mut model = MockChatModel::new();
        model.expect_complete().times(1).returning(|_, _| {
            Ok(ModelReply::ToolCalls {
                content: None,
                calls: vec![tool_call("x", "check_calendar", r#"{"date":"today"}"#)],
            })
        });

        let agent = CalendarAgent::new(Arc::new(model), context(MockCalendarService::new()))
            .with_max_iterations(0);
        let err = agent.run("anything").await.unwrap_err();
        assert!(matches!(err, AgentError::IterationLimit(1)));
    }
}
