//! Multi-turn conversations through `KidShellEngine::process_input`.

mod common;

use common::Conversation;
use kidshell_kernel::types::{
    Content, EmojiMatch, LoopRun, MathResult, Number, QuizContent, ResponseType, SymbolContent, SymbolValue,
};
use serde_json::json;

// ============================================================================
// Quiz flow
// ============================================================================

#[test]
fn test_empty_input_on_fresh_session_starts_quiz() {
    let mut chat = Conversation::new();
    let exchange = chat.say("");
    let response = exchange.expect_kind(ResponseType::Quiz);
    let Content::Quiz(QuizContent::Prompt(quiz)) = &response.content else {
        panic!("expected a prompt: {response:?}");
    };
    assert_eq!(quiz.id, "q1");
    assert_eq!(quiz.question, "2 + 3");
    assert_eq!(chat.session().current_quiz.as_ref().map(|q| q.id.as_str()), Some("q1"));
    assert!(exchange.pending.is_none());
}

#[test]
fn test_wrong_then_right() {
    let mut chat = Conversation::new();
    chat.say("");

    let miss = chat.say("4");
    let Content::Quiz(QuizContent::Incorrect(missed)) = &miss.expect_kind(ResponseType::Quiz).content else {
        panic!("expected a miss");
    };
    assert_eq!(missed.attempts, 1);
    assert_eq!(missed.number_facts.as_ref().map(|f| f.number), Some(4));
    assert_eq!(chat.session().current_streak, 0);

    let hit = chat.say("5");
    assert_eq!(hit.kind(), ResponseType::Achievement);
    let pending = hit.pending.as_ref().expect("quiz response parked");
    let Content::Quiz(QuizContent::Correct(solved)) = &pending.content else {
        panic!("expected a solve: {pending:?}");
    };
    assert_eq!(solved.answer, 5);
    assert_eq!(solved.next_quiz.id, "q2");
    assert_eq!(chat.session().problems_solved, 1);
    assert_eq!(chat.session().quiz_attempts.get("q1"), Some(&2));
}

#[test]
fn test_third_miss_gives_a_clue() {
    let mut chat = Conversation::new();
    chat.say("");

    let hints: Vec<String> = chat
        .script(&["1", "2", "3"])
        .into_iter()
        .map(|exchange| match exchange.primary.content {
            Content::Quiz(QuizContent::Incorrect(missed)) => missed.hint,
            other => panic!("expected a miss, got {other:?}"),
        })
        .collect();

    assert!(!hints[0].contains("clue"));
    assert!(!hints[1].contains("clue"));
    assert_eq!(hints[2], "Great persistence! Helpful clue: The answer is less than 10.");
}

#[test]
fn test_empty_input_repeats_active_quiz() {
    let mut chat = Conversation::new();
    chat.say("");
    chat.say("9");
    let again = chat.say("");
    assert_eq!(again.primary.meta("quiz_id"), Some(&json!("q1")));
    assert_eq!(chat.session().quiz_attempts.get("q1"), Some(&1));
}

#[test]
fn test_fifth_solve_unlocks_high_five() {
    let mut chat = Conversation::new();
    for _ in 0..4 {
        chat.solve();
    }
    assert_eq!(chat.session().problems_solved, 4);
    assert!(chat.session().achievements.contains("streak_3"));

    let fifth = chat.solve();
    let Content::Achievement(unlock) = &fifth.expect_kind(ResponseType::Achievement).content else {
        unreachable!();
    };
    assert_eq!(unlock.achievements, vec!["first_five", "streak_5"]);
    assert_eq!(unlock.total_solved, 5);
    assert_eq!(unlock.streak, 5);
    assert_eq!(unlock.badges[0].name, "High Five");
    assert_eq!(fifth.pending.as_ref().map(|r| r.kind()), Some(ResponseType::Quiz));

    let sixth = chat.solve();
    assert_eq!(sixth.kind(), ResponseType::Quiz);
    assert!(sixth.pending.is_none());
}

#[test]
fn test_undrained_pending_is_dropped() {
    let mut chat = Conversation::new();
    chat.say("");
    let unlock = chat.engine.process_input("5");
    assert_eq!(unlock.kind(), ResponseType::Achievement);

    let next = chat.engine.process_input("2 + 2");
    assert_eq!(next.kind(), ResponseType::MathResult);
    assert!(chat.engine.take_pending_response().is_none());
}

#[test]
fn test_loop_during_quiz_is_not_an_answer() {
    let mut chat = Conversation::new();
    chat.say("");
    let exchange = chat.say("0...4...2");
    assert_eq!(
        exchange.expect_kind(ResponseType::LoopResult).content,
        Content::LoopResult(LoopRun {
            start: 0,
            end: 4,
            step: 2,
            pause: 0.0,
            numbers: vec![0, 2, 4],
        })
    );
    assert!(chat.session().quiz_attempts.is_empty());
    assert!(chat.session().current_quiz.is_some());
}

// ============================================================================
// Math
// ============================================================================

#[test]
fn test_plain_arithmetic() {
    let mut chat = Conversation::new();
    let exchange = chat.say("2 + 2");
    exchange.expect_kind(ResponseType::MathResult);
    assert_eq!(exchange.number(), Number::Int(4));
    assert_eq!(chat.session().last_number(), Number::Int(4));
}

#[test]
fn test_x_between_numbers_means_times() {
    let mut chat = Conversation::new();
    let exchange = chat.say("8 x 6");
    let Content::MathResult(MathResult { expression, note, .. }) = &exchange.expect_kind(ResponseType::MathResult).content
    else {
        unreachable!();
    };
    assert_eq!(expression, "8 * 6");
    assert!(note.as_deref().is_some_and(|n| n.contains("multiplication")));
    assert_eq!(exchange.number(), Number::Int(48));
}

#[test]
fn test_leading_operator_chains_on_last_number() {
    let mut chat = Conversation::new();
    chat.say("3");
    assert_eq!(chat.say("+5").number(), Number::Int(8));
    assert_eq!(chat.say("*2").number(), Number::Int(16));
    assert_eq!(chat.session().last_number(), Number::Int(16));
}

#[test]
fn test_constant_lookup() {
    let mut chat = Conversation::new();
    let exchange = chat.say("pi");
    assert_eq!(exchange.primary.meta("source"), Some(&json!("math_env")));
    assert_eq!(exchange.number(), Number::Float(std::f64::consts::PI));
}

#[test]
fn test_division_by_zero_is_an_error_response() {
    let mut chat = Conversation::new();
    let exchange = chat.say("1 / 0");
    assert_eq!(exchange.expect_kind(ResponseType::Error).as_text(), Some("Division by zero"));
    assert_eq!(chat.session().activities.back().map(|a| a.success), Some(false));
}

#[test]
fn test_overflowing_builtin_is_a_math_error() {
    let mut chat = Conversation::new();
    let exchange = chat.say("exp(1000)");
    let message = exchange.expect_kind(ResponseType::Error).as_text().unwrap_or_default();
    assert!(message.starts_with("Math error"), "{message}");
}

#[test]
fn test_most_negative_loop_step_answers_instead_of_panicking() {
    let mut chat = Conversation::new();
    chat.say("1...5...-9223372036854775808").expect_kind(ResponseType::Error);
    assert_eq!(chat.say("1...3").kind(), ResponseType::LoopResult);
}

#[test]
fn test_unsafe_input_never_escapes() {
    let mut chat = Conversation::new();
    for line in ["__import__('os')", "eval(1)", "9 ** 9999", "(((((((((("] {
        let exchange = chat.say(line);
        assert!(
            matches!(exchange.kind(), ResponseType::Error | ResponseType::Text),
            "{line}: {:?}",
            exchange.primary
        );
    }
}

// ============================================================================
// Symbols
// ============================================================================

#[test]
fn test_symbol_then_value_then_expression() {
    let mut chat = Conversation::new();

    let created = chat.say("x");
    assert_eq!(
        created.expect_kind(ResponseType::SymbolResult).content,
        Content::SymbolResult(SymbolContent::Created {
            symbol: "x".into(),
            value: SymbolValue::Placeholder("x".into()),
        })
    );

    let assigned = chat.say("x = 7");
    assert_eq!(
        assigned.expect_kind(ResponseType::SymbolResult).content,
        Content::SymbolResult(SymbolContent::Assigned {
            symbol: "x".into(),
            value: Number::Int(7),
        })
    );

    let evaluated = chat.say("x + 3");
    evaluated.expect_kind(ResponseType::SymbolResult);
    assert_eq!(evaluated.number(), Number::Int(10));
}

#[test]
fn test_unknown_symbol_is_coached() {
    let mut chat = Conversation::new();
    chat.say("foo");
    let exchange = chat.say("foo + 1");
    let response = exchange.expect_kind(ResponseType::Text);
    assert_eq!(response.meta("symbol"), Some(&json!("foo")));
    assert_eq!(response.meta("expression"), Some(&json!("foo + 1")));
}

#[test]
fn test_short_word_becomes_symbol() {
    let mut chat = Conversation::new();
    chat.say("foo").expect_kind(ResponseType::SymbolResult);
    let again = chat.say("foo");
    assert!(matches!(
        again.primary.content,
        Content::SymbolResult(SymbolContent::Found { .. })
    ));
}

// ============================================================================
// Words
// ============================================================================

#[test]
fn test_tree_is_emoji_not_symbol() {
    let mut chat = Conversation::new();
    let exchange = chat.say("tree");
    let Content::Emoji(EmojiMatch { emojis, multiple, .. }) = &exchange.expect_kind(ResponseType::Emoji).content else {
        unreachable!();
    };
    assert!(*multiple);
    assert!(emojis.contains(&"🌲".to_string()));
    assert!(!chat.session().symbols_env.contains_key("tree"));
}

#[test]
fn test_colour_name() {
    let mut chat = Conversation::new();
    let exchange = chat.say("red");
    let Content::Color(swatch) = &exchange.expect_kind(ResponseType::Color).content else {
        unreachable!();
    };
    assert_eq!(swatch.color, "#ff0000");
}

#[test]
fn test_custom_data_wins_over_colour() {
    let mut chat = Conversation::new();
    chat.engine.set_custom_data(
        [
            ("blue".to_string(), json!("Grandpa's truck")),
            ("hello".to_string(), json!("Hi there, friend!")),
        ]
        .into_iter()
        .collect(),
    );

    let blue = chat.say("blue");
    assert_eq!(blue.expect_kind(ResponseType::Text).as_text(), Some("Grandpa's truck"));

    let hello = chat.say("HELLO");
    assert_eq!(hello.expect_kind(ResponseType::Text).as_text(), Some("Hi there, friend!"));
}

#[test]
fn test_number_tree() {
    let mut chat = Conversation::new();
    let exchange = chat.say("12");
    let Content::TreeDisplay(facts) = &exchange.expect_kind(ResponseType::TreeDisplay).content else {
        unreachable!();
    };
    assert_eq!(facts.number, 12);
    assert!(facts.factors.contains(&(3, 4)));
    assert_eq!(exchange.primary.meta("is_prime"), Some(&json!(false)));
    assert_eq!(chat.session().last_number(), Number::Int(12));
}

#[test]
fn test_keyboard_smash() {
    let mut chat = Conversation::new();
    assert_eq!(chat.say("aaaaaaa").primary.as_text(), Some("7 x a"));
}
