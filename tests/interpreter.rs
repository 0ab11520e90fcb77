//! Session tests: stepping, validation, history and control operations.
mod common;
use annai::graph::{ChoiceSource, Combinator, Condition, Operator, Predicate, ValidationSpec};
use annai::interpreter::AdapterEvent;
use annai::prelude::*;
use common::*;
use std::collections::BTreeMap;

fn graph_of(screens: Vec<Screen>) -> DialogueGraph {
    DialogueGraph {
        screens,
        code_definitions: Default::default(),
        domain_data: Default::default(),
        entry: 1,
    }
}

fn terminal(id: ScreenId, end: EndType) -> Screen {
    Screen {
        id,
        prompt: format!("end {}", id),
        source_id: None,
        kind: ScreenKind::Terminal { end },
        transitions: Vec::new(),
    }
}

fn condition_screen(
    id: ScreenId,
    condition: Condition,
    on_match: ScreenId,
    on_default: ScreenId,
) -> Screen {
    Screen {
        id,
        prompt: "条件判定中...".to_string(),
        source_id: None,
        kind: ScreenKind::Condition { condition },
        transitions: vec![
            Transition::new(Guard::Match, on_match),
            Transition::new(Guard::Default, on_default),
        ],
    }
}

fn variables(pairs: &[(&str, &str)]) -> BTreeMap<String, Value> {
    pairs
        .iter()
        .map(|(name, value)| (name.to_string(), Value::from(*value)))
        .collect()
}

fn history_screens(session: &Session) -> Vec<ScreenId> {
    session.state().history.iter().map(|h| h.screen).collect()
}

#[cfg(test)]
mod atm_tests {
    use super::*;

    #[test]
    fn test_payout_over_ceiling_is_blocked() {
        let graph = compile_atm();
        let interpreter = Interpreter::new(&graph).expect("graph should verify");
        let mut session = interpreter.session_with_clock(fixed_clock());
        let mut adapter = ScriptedAdapter::new(["日本語", "払出", "250000"]);

        let outcome = session.run(&mut adapter).expect("run should succeed");

        assert_eq!(
            outcome,
            StepOutcome::Finished {
                screen: atm::BLOCKED,
                end: EndType::Error
            }
        );
        assert_eq!(session.status(), SessionStatus::Finished(EndType::Error));
        assert_eq!(session.variable("language"), Some(&Value::from("Japanese")));
        assert_eq!(session.variable("transactionType"), Some(&Value::from("payment")));
        // The overflow transition assigns nothing.
        assert_eq!(session.variable("payoutAmount"), None);
        assert_eq!(adapter.remaining(), 0);
    }

    #[test]
    fn test_payout_within_ceiling_completes() {
        let graph = compile_atm();
        let interpreter = Interpreter::new(&graph).expect("graph should verify");
        let mut session = interpreter.session_with_clock(fixed_clock());
        let mut adapter = ScriptedAdapter::new(["日本語", "払出", "5000", "確認"]);

        let outcome = session.run(&mut adapter).expect("run should succeed");

        assert_eq!(
            outcome,
            StepOutcome::Finished {
                screen: atm::DONE,
                end: EndType::Success
            }
        );
        assert_eq!(session.variable("payoutAmount"), Some(&Value::Number(5000.0)));
        assert_eq!(
            history_screens(&session),
            vec![
                atm::LANGUAGE,
                atm::TRANSACTION_TYPE,
                atm::IS_DEPOSIT,
                atm::IS_PAYMENT,
                atm::PAYOUT_AMOUNT,
                atm::PAYOUT_CONFIRM,
                atm::DONE,
            ]
        );

        let history = &session.state().history;
        assert_eq!(history[0].choice.as_deref(), Some("日本語"));
        assert_eq!(history[4].input.as_deref(), Some("5000"));
        assert_eq!(history[5].choice.as_deref(), Some("確認"));
        assert!(history[2].choice.is_none() && history[2].input.is_none());

        let confirm_prompt = adapter.last_prompt().expect("a prompt was shown");
        assert_eq!(
            confirm_prompt,
            "以下の内容でよろしいですか？\n\n取引種別: 払出\n払出金額: ￥5,000"
        );
        assert!(matches!(
            adapter.transcript().last(),
            Some(AdapterEvent::Terminal { end: EndType::Success, .. })
        ));
    }

    #[test]
    fn test_choice_prompt_offers_code_labels() {
        let graph = compile_atm();
        let interpreter = Interpreter::new(&graph).expect("graph should verify");
        let mut session = interpreter.session();
        let mut adapter = ScriptedAdapter::default();

        let outcome = session.step(&mut adapter).unwrap();

        assert_eq!(outcome, StepOutcome::Suspended { screen: atm::LANGUAGE });
        assert_eq!(
            adapter.transcript()[0],
            AdapterEvent::ChoicePrompt {
                text: "言語を選択してください。".to_string(),
                choices: vec!["日本語".to_string(), "English".to_string(), "中文".to_string()],
            }
        );
    }

    #[test]
    fn test_amount_bounds() {
        let graph = compile_atm();
        let interpreter = Interpreter::new(&graph).expect("graph should verify");

        for (amount, accepted) in [
            ("0", false),
            ("1", true),
            ("10000000", true),
            ("10000001", false),
            ("abc", false),
            ("inf", false),
        ] {
            let mut session = interpreter.session();
            let mut adapter = ScriptedAdapter::new(["日本語", "預入"]);
            session.run(&mut adapter).unwrap();
            assert_eq!(session.state().current_screen, atm::DEPOSIT_AMOUNT);
            assert_eq!(
                session.current_screen().map(|s| s.prompt.as_str()),
                graph.screen(atm::DEPOSIT_AMOUNT).map(|s| s.prompt.as_str())
            );

            adapter.push_response(amount);
            let outcome = session.step(&mut adapter).unwrap();
            if accepted {
                assert_eq!(
                    outcome,
                    StepOutcome::Advanced {
                        from: atm::DEPOSIT_AMOUNT,
                        to: atm::DEPOSIT_CONFIRM
                    },
                    "{} should be accepted",
                    amount
                );
            } else {
                assert_eq!(
                    outcome,
                    StepOutcome::Rejected {
                        screen: atm::DEPOSIT_AMOUNT,
                        message: "1円以上1000万円以下で入力してください".to_string(),
                    },
                    "{} should be rejected",
                    amount
                );
                assert_eq!(session.variable("depositAmount"), None);
            }
        }
    }

    #[test]
    fn test_rejections_do_not_duplicate_history() {
        let graph = compile_atm();
        let interpreter = Interpreter::new(&graph).expect("graph should verify");
        let mut session = interpreter.session_with_clock(fixed_clock());
        let mut adapter = ScriptedAdapter::new(["Klingon", "日本語", "預入", "0", "", "3000"]);

        assert_eq!(
            session.step(&mut adapter).unwrap(),
            StepOutcome::NoTransition {
                screen: atm::LANGUAGE,
                response: "Klingon".to_string()
            }
        );
        assert_eq!(history_screens(&session), vec![atm::LANGUAGE]);
        assert_eq!(session.state().history[0].choice, None);

        // Resumes on the same screen.
        session.step(&mut adapter).unwrap();
        session.step(&mut adapter).unwrap();
        assert!(matches!(session.step(&mut adapter).unwrap(), StepOutcome::Rejected { .. }));
        assert!(matches!(session.step(&mut adapter).unwrap(), StepOutcome::Rejected { .. }));
        assert_eq!(
            session.step(&mut adapter).unwrap(),
            StepOutcome::Advanced {
                from: atm::DEPOSIT_AMOUNT,
                to: atm::DEPOSIT_CONFIRM
            }
        );

        assert_eq!(
            history_screens(&session),
            vec![
                atm::LANGUAGE,
                atm::TRANSACTION_TYPE,
                atm::IS_DEPOSIT,
                atm::DEPOSIT_AMOUNT
            ]
        );
        assert_eq!(session.state().history[3].input.as_deref(), Some("3000"));
        assert_eq!(adapter.validation_errors().count(), 3);
    }

    #[test]
    fn test_transfer_routing() {
        let graph = compile_atm();
        let interpreter = Interpreter::new(&graph).expect("graph should verify");

        let mut session = interpreter.session();
        let mut adapter = ScriptedAdapter::new(["日本語", "振込", "その他"]);
        let outcome = session.run(&mut adapter).unwrap();
        assert_eq!(
            outcome,
            StepOutcome::Finished {
                screen: atm::BLOCKED,
                end: EndType::Error
            }
        );

        let mut session = interpreter.session();
        let mut adapter = ScriptedAdapter::new([
            "日本語",
            "振込",
            "日本",
            "その他",
            "さくら信用金庫",
            "支店コード",
            "123",
            "1234567",
            "30000",
            "確認",
        ]);
        let outcome = session.run(&mut adapter).unwrap();
        assert_eq!(
            outcome,
            StepOutcome::Finished {
                screen: atm::DONE,
                end: EndType::Success
            }
        );
        assert!(history_screens(&session).contains(&atm::INSTITUTION_SEARCH));
        assert!(history_screens(&session).contains(&atm::BRANCH_CODE));
        assert!(!history_screens(&session).contains(&atm::BRANCH_NAME));
        assert_eq!(session.variable("branchCode"), Some(&Value::from("123")));
        assert_eq!(session.variable("transferAmount"), Some(&Value::Number(30000.0)));
    }

    #[test]
    fn test_amend_returns_to_entry() {
        let graph = compile_atm();
        let interpreter = Interpreter::new(&graph).expect("graph should verify");
        let mut session = interpreter.session();
        let mut adapter = ScriptedAdapter::new(["日本語", "預入", "100", "修正"]);

        let outcome = session.run(&mut adapter).unwrap();

        assert_eq!(outcome, StepOutcome::Suspended { screen: atm::LANGUAGE });
        assert_eq!(session.variable("depositAmount"), Some(&Value::Number(100.0)));
    }

    #[test]
    fn test_jump_to_skips_validation() {
        let graph = compile_atm();
        let interpreter = Interpreter::new(&graph).expect("graph should verify");
        let mut session = interpreter.session_with_clock(fixed_clock());
        let mut adapter = ScriptedAdapter::new(["5000"]);

        session.jump_to(atm::PAYOUT_AMOUNT);
        assert_eq!(history_screens(&session), vec![atm::PAYOUT_AMOUNT]);

        let outcome = session.step(&mut adapter).unwrap();
        assert_eq!(
            outcome,
            StepOutcome::Advanced {
                from: atm::PAYOUT_AMOUNT,
                to: atm::PAYOUT_CONFIRM
            }
        );
        // The jump opened the visit; stepping did not record it again.
        assert_eq!(history_screens(&session), vec![atm::PAYOUT_AMOUNT]);
        assert_eq!(session.variable("transactionType"), None);
    }

    #[test]
    fn test_finished_session_refuses_steps_until_restart() {
        let graph = compile_atm();
        let interpreter = Interpreter::new(&graph).expect("graph should verify");
        let mut session = interpreter.session();
        let mut adapter = ScriptedAdapter::new(["日本語", "払出", "999999"]);
        session.run(&mut adapter).unwrap();

        assert_eq!(session.step(&mut adapter), Err(DialogueError::SessionFinished));

        session.restart();
        assert_eq!(session.status(), SessionStatus::Active);
        assert_eq!(session.state().current_screen, atm::LANGUAGE);
        assert_eq!(session.variable("transactionType"), Some(&Value::from("payment")));
        assert_eq!(history_screens(&session).last(), Some(&atm::LANGUAGE));

        adapter.push_response("English");
        assert_eq!(
            session.step(&mut adapter).unwrap(),
            StepOutcome::Advanced {
                from: atm::LANGUAGE,
                to: atm::TRANSACTION_TYPE
            }
        );
        assert_eq!(session.variable("language"), Some(&Value::from("English")));
    }

    #[test]
    fn test_unknown_screen_aborts() {
        let graph = compile_atm();
        let interpreter = Interpreter::new(&graph).expect("graph should verify");
        let mut session = interpreter.session();
        let mut adapter = ScriptedAdapter::new(["日本語"]);

        session.jump_to(999);
        assert_eq!(session.step(&mut adapter), Err(DialogueError::ScreenNotFound(999)));
        assert_eq!(session.status(), SessionStatus::Aborted);
        assert_eq!(session.step(&mut adapter), Err(DialogueError::SessionAborted));
        assert!(adapter.transcript().is_empty());
    }

    #[test]
    fn test_suspended_session_resumes() {
        let graph = compile_atm();
        let interpreter = Interpreter::new(&graph).expect("graph should verify");
        let mut session = interpreter.session();
        let mut adapter = ScriptedAdapter::default();

        assert_eq!(
            session.run(&mut adapter).unwrap(),
            StepOutcome::Suspended { screen: atm::LANGUAGE }
        );
        assert_eq!(
            session.run(&mut adapter).unwrap(),
            StepOutcome::Suspended { screen: atm::LANGUAGE }
        );
        assert_eq!(history_screens(&session), vec![atm::LANGUAGE]);

        adapter.push_response("中文");
        session.step(&mut adapter).unwrap();
        assert_eq!(session.variable("language"), Some(&Value::from("Chinese")));
    }

    #[test]
    fn test_snapshot_serializes_state() {
        let graph = compile_atm();
        let interpreter = Interpreter::new(&graph).expect("graph should verify");
        let mut session = interpreter.session_with_clock(fixed_clock());
        let mut adapter = ScriptedAdapter::new(["日本語", "払出", "5000"]);
        session.run(&mut adapter).unwrap();

        let snapshot = session.snapshot();
        let json = snapshot.to_json().expect("snapshot should serialize");

        assert!(json.contains("\"currentScreen\": 9"));
        assert!(json.contains("2025-01-01T09:00:00Z"));
        assert!(json.contains("\"transactionType\": \"payment\""));

        let restored: SessionState = serde_json::from_str(&json).expect("snapshot should parse");
        assert_eq!(restored, snapshot);
    }
}

#[cfg(test)]
mod graph_tests {
    use super::*;

    #[test]
    fn test_wildcard_accepts_any_label() {
        let graph = graph_of(vec![
            Screen {
                id: 1,
                prompt: "Pick".to_string(),
                source_id: None,
                kind: ScreenKind::Choice {
                    choices: ChoiceSource::Labels(vec!["A".to_string(), "B".to_string()]),
                    display: Vec::new(),
                },
                transitions: vec![
                    Transition::new(Guard::Choice("A".to_string()), 2),
                    Transition::new(Guard::Wildcard, 3),
                ],
            },
            terminal(2, EndType::Success),
            terminal(3, EndType::Error),
        ]);
        let interpreter = Interpreter::new(&graph).expect("graph should verify");

        for (response, end) in [("A", 2), ("B", 3), ("anything", 3)] {
            let mut session = interpreter.session();
            let outcome = session.run(&mut ScriptedAdapter::new([response])).unwrap();
            assert!(
                matches!(outcome, StepOutcome::Finished { screen, .. } if screen == end),
                "'{}' should end on {}",
                response,
                end
            );
        }
    }

    #[test]
    fn test_condition_combinators() {
        let predicates = vec![
            Predicate::new("a", Operator::Equals, "1"),
            Predicate::new("b", Operator::Equals, "2"),
        ];
        let cases = [
            (Combinator::Or, predicates.clone(), 2),
            (Combinator::And, predicates, 3),
            (Combinator::And, Vec::new(), 2),
            (Combinator::Or, Vec::new(), 3),
        ];

        for (combinator, predicates, expected) in cases {
            let condition = Condition {
                combinator,
                predicates,
            };
            let graph = graph_of(vec![
                condition_screen(1, condition, 2, 3),
                terminal(2, EndType::Success),
                terminal(3, EndType::Error),
            ]);
            let interpreter = Interpreter::new(&graph).expect("graph should verify");
            let mut session = interpreter
                .session()
                .with_variables(variables(&[("a", "0"), ("b", "2")]));

            let outcome = session.step(&mut ScriptedAdapter::default()).unwrap();
            assert!(matches!(outcome, StepOutcome::Finished { screen, .. } if screen == expected));
            // Condition screens are never shown to the adapter.
            assert_eq!(history_screens(&session), vec![1, expected]);
        }
    }

    #[test]
    fn test_missing_variable_compares_as_empty() {
        let condition = Condition {
            combinator: Combinator::And,
            predicates: vec![Predicate::new("unset", Operator::Equals, "")],
        };
        let graph = graph_of(vec![
            condition_screen(1, condition, 2, 3),
            terminal(2, EndType::Success),
            terminal(3, EndType::Error),
        ]);
        let interpreter = Interpreter::new(&graph).expect("graph should verify");
        let mut session = interpreter.session();

        assert_eq!(
            session.step(&mut ScriptedAdapter::default()).unwrap(),
            StepOutcome::Finished {
                screen: 2,
                end: EndType::Success
            }
        );
    }

    #[test]
    fn test_condition_cycle_aborts() {
        let always = || Condition {
            combinator: Combinator::And,
            predicates: Vec::new(),
        };
        let graph = graph_of(vec![
            condition_screen(1, always(), 2, 2),
            condition_screen(2, always(), 1, 1),
        ]);
        let interpreter = Interpreter::new(&graph).expect("graph should verify");
        let mut session = interpreter.session();

        assert_eq!(
            session.step(&mut ScriptedAdapter::default()),
            Err(DialogueError::ConditionCycle(1))
        );
        assert_eq!(session.status(), SessionStatus::Aborted);
    }

    #[test]
    fn test_input_without_matching_transition() {
        let graph = graph_of(vec![
            Screen {
                id: 1,
                prompt: "Amount".to_string(),
                source_id: None,
                kind: ScreenKind::Input {
                    validation: ValidationSpec::number(0.0, 100.0),
                },
                transitions: vec![Transition::new(
                    Guard::Predicate(Predicate::on_input(Operator::Greater, "10")),
                    2,
                )
                .assign("amount", AssignedValue::FromUserInput)],
            },
            terminal(2, EndType::Success),
        ]);
        let interpreter = Interpreter::new(&graph).expect("graph should verify");
        let mut session = interpreter.session();
        let mut adapter = ScriptedAdapter::new(["5", "50"]);

        assert_eq!(
            session.step(&mut adapter).unwrap(),
            StepOutcome::NoTransition {
                screen: 1,
                response: "5".to_string()
            }
        );
        assert_eq!(adapter.validation_errors().count(), 1);
        assert_eq!(session.variable("amount"), None);

        assert_eq!(
            session.step(&mut adapter).unwrap(),
            StepOutcome::Advanced { from: 1, to: 2 }
        );
        assert_eq!(session.variable("amount"), Some(&Value::Number(50.0)));
    }

    #[test]
    fn test_invalid_graph_is_refused() {
        let graph = graph_of(vec![Screen {
            id: 1,
            prompt: "Next".to_string(),
            source_id: None,
            kind: ScreenKind::Choice {
                choices: ChoiceSource::Labels(Vec::new()),
                display: Vec::new(),
            },
            transitions: vec![Transition::new(Guard::Wildcard, 7)],
        }]);

        assert!(matches!(
            Interpreter::new(&graph),
            Err(DialogueError::InvalidGraph(IntegrityError::DanglingTarget {
                screen: 1,
                target: 7
            }))
        ));
    }
}

#[cfg(test)]
mod input_tests {
    use super::*;

    fn single_input(input: InputField) -> DialogueGraph {
        let procedure = ProcedureDefinition {
            workflow: vec![
                input_node_with("entry", "入力してください。", input),
                terminal_node("done", "手続き完了", TerminalMarker::Success),
            ],
            ..ProcedureDefinition::default()
        };
        compile(&procedure).expect("Failed to compile")
    }

    #[test]
    fn test_required_text_input() {
        let graph = single_input(InputField::new("name"));
        let interpreter = Interpreter::new(&graph).expect("graph should verify");
        let mut session = interpreter.session();
        let mut adapter = ScriptedAdapter::new(["", "   ", "山田"]);

        assert_eq!(
            session.step(&mut adapter).unwrap(),
            StepOutcome::Rejected {
                screen: 1,
                message: "A value is required".to_string()
            }
        );
        assert!(matches!(session.step(&mut adapter).unwrap(), StepOutcome::Rejected { .. }));
        assert_eq!(session.step(&mut adapter).unwrap(), StepOutcome::Advanced { from: 1, to: 2 });
        assert_eq!(session.variable("name"), Some(&Value::from("山田")));
    }

    #[test]
    fn test_optional_input_accepts_empty() {
        let graph = single_input(InputField {
            required: Some(false),
            ..InputField::new("note")
        });
        let interpreter = Interpreter::new(&graph).expect("graph should verify");
        let mut session = interpreter.session();

        session.step(&mut ScriptedAdapter::new([""])).unwrap();
        assert_eq!(session.variable("note"), Some(&Value::from("")));
    }

    #[test]
    fn test_pattern_and_length_rules() {
        let graph = single_input(InputField {
            pattern: Some("^[0-9]+$".to_string()),
            min_length: Some(7),
            error_message: Some("7桁の数字で入力してください".to_string()),
            ..InputField::new("accountNumber")
        });
        let interpreter = Interpreter::new(&graph).expect("graph should verify");
        let mut session = interpreter.session();
        let mut adapter = ScriptedAdapter::new(["123", "12345a7", "1234567"]);

        for _ in 0..2 {
            assert_eq!(
                session.step(&mut adapter).unwrap(),
                StepOutcome::Rejected {
                    screen: 1,
                    message: "7桁の数字で入力してください".to_string()
                }
            );
        }
        assert_eq!(session.step(&mut adapter).unwrap(), StepOutcome::Advanced { from: 1, to: 2 });
        assert_eq!(session.variable("accountNumber"), Some(&Value::from("1234567")));
    }
}
