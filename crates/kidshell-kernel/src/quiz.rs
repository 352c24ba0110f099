//! Quiz generation and answer coaching.
//!
//! Question generation sits behind the [`QuizSource`] trait so the engine can
//! run on real randomness while tests replay a fixed script.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use kidshell_types::{Difficulty, Operation, Quiz};

/// Wrong attempts after which a clue is offered.
pub const CLUE_AFTER_ATTEMPTS: u32 = 3;

/// Something that hands out the next question.
pub trait QuizSource: Send {
    fn next_quiz(&mut self, difficulty: Difficulty) -> Quiz;
}

/// Operations and operand ranges available at each level.
struct LevelPlan {
    operations: &'static [Operation],
    sum_max: i64,
    factor_max: i64,
}

fn plan(difficulty: Difficulty) -> LevelPlan {
    use Operation::*;
    match difficulty.level() {
        1 => LevelPlan {
            operations: &[Add, Subtract],
            sum_max: 10,
            factor_max: 1,
        },
        2 => LevelPlan {
            operations: &[Add, Subtract, Multiply],
            sum_max: 20,
            factor_max: 5,
        },
        3 => LevelPlan {
            operations: &[Add, Subtract, Multiply, Divide],
            sum_max: 50,
            factor_max: 10,
        },
        _ => LevelPlan {
            operations: &[Add, Subtract, Multiply, Divide],
            sum_max: 100,
            factor_max: 12,
        },
    }
}

/// Random questions with uuid ids.
#[derive(Debug)]
pub struct RandomQuizSource {
    rng: StdRng,
}

impl RandomQuizSource {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Fixed seed, for reproducible question sequences.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn operands(&mut self, operation: Operation, plan: &LevelPlan) -> (i64, i64) {
        let rng = &mut self.rng;
        match operation {
            Operation::Add => (rng.gen_range(1..=plan.sum_max), rng.gen_range(1..=plan.sum_max)),
            Operation::Subtract => {
                let a = rng.gen_range(1..=plan.sum_max);
                let b = rng.gen_range(1..=plan.sum_max);
                (a.max(b), a.min(b))
            }
            Operation::Multiply => (
                rng.gen_range(1..=plan.factor_max),
                rng.gen_range(1..=plan.factor_max),
            ),
            Operation::Divide => {
                // Build from the product so the answer is always whole.
                let divisor = rng.gen_range(2..=plan.factor_max.max(2));
                let quotient = rng.gen_range(1..=plan.factor_max);
                (divisor * quotient, divisor)
            }
        }
    }
}

impl Default for RandomQuizSource {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizSource for RandomQuizSource {
    fn next_quiz(&mut self, difficulty: Difficulty) -> Quiz {
        let plan = plan(difficulty);
        let operation = plan.operations[self.rng.gen_range(0..plan.operations.len())];
        let (left, right) = self.operands(operation, &plan);
        let id = Uuid::new_v4().to_string();

        Quiz::arithmetic(id.clone(), operation, left, right, difficulty).unwrap_or_else(|| {
            tracing::warn!(?operation, left, right, "generated quiz had no whole answer");
            sum_quiz(id, left, right, difficulty)
        })
    }
}

fn sum_quiz(id: String, left: i64, right: i64, difficulty: Difficulty) -> Quiz {
    Quiz {
        id,
        question: format!("{left} + {right}"),
        answer: left + right,
        difficulty,
        kind: "math".to_string(),
        operation: Operation::Add,
        operands: [left, right],
    }
}

/// Replays a fixed list of questions; the last one repeats once exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedQuizzes {
    quizzes: Vec<Quiz>,
    next: usize,
    /// Difficulties requested so far, oldest first.
    pub requested: Vec<Difficulty>,
}

impl ScriptedQuizzes {
    pub fn new(quizzes: Vec<Quiz>) -> Self {
        Self {
            quizzes,
            next: 0,
            requested: Vec::new(),
        }
    }

    /// Additions `a + b` with ids `q1`, `q2`, ...
    pub fn additions(pairs: &[(i64, i64)]) -> Self {
        let quizzes = pairs
            .iter()
            .enumerate()
            .filter_map(|(i, &(a, b))| {
                Quiz::arithmetic(format!("q{}", i + 1), Operation::Add, a, b, Difficulty::default())
            })
            .collect();
        Self::new(quizzes)
    }
}

impl QuizSource for ScriptedQuizzes {
    fn next_quiz(&mut self, difficulty: Difficulty) -> Quiz {
        self.requested.push(difficulty);
        let index = self.next.min(self.quizzes.len().saturating_sub(1));
        self.next += 1;
        match self.quizzes.get(index) {
            Some(quiz) => Quiz {
                difficulty,
                ..quiz.clone()
            },
            None => sum_quiz("scripted".to_string(), 1, 1, difficulty),
        }
    }
}

/// A gentle pointer toward `answer`.
pub fn clue_for(answer: i64) -> String {
    if answer < 10 {
        "The answer is less than 10.".to_string()
    } else if answer < 50 {
        let tens = answer / 10 * 10;
        format!("The answer is between {tens} and {}.", tens + 10)
    } else {
        let first = answer.to_string().chars().next().unwrap_or('0');
        format!("The answer starts with {first}.")
    }
}

/// Hint text for a miss, with a clue once the child has tried enough times.
pub fn hint_for(answer: i64, attempts: u32) -> String {
    if attempts >= CLUE_AFTER_ATTEMPTS {
        format!("Great persistence! Helpful clue: {}", clue_for(answer))
    } else {
        "Great attempt! Keep going on this one.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(7, "The answer is less than 10.")]
    #[case(23, "The answer is between 20 and 30.")]
    #[case(40, "The answer is between 40 and 50.")]
    #[case(72, "The answer starts with 7.")]
    fn test_clue_for(#[case] answer: i64, #[case] expected: &str) {
        assert_eq!(clue_for(answer), expected);
    }

    #[test]
    fn test_hint_needs_three_attempts() {
        assert_eq!(hint_for(23, 2), "Great attempt! Keep going on this one.");
        assert_eq!(
            hint_for(23, 3),
            "Great persistence! Helpful clue: The answer is between 20 and 30."
        );
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    #[case(4)]
    fn test_random_quizzes_are_well_formed(#[case] level: u8) {
        let mut source = RandomQuizSource::seeded(42);
        let difficulty = Difficulty::new(level);
        for _ in 0..200 {
            let quiz = source.next_quiz(difficulty);
            let [left, right] = quiz.operands;
            assert_eq!(quiz.operation.apply(left, right), Some(quiz.answer));
            assert!(quiz.answer >= 0, "{} = {}", quiz.question, quiz.answer);
            assert_eq!(quiz.difficulty, difficulty);
            assert!(plan(difficulty).operations.contains(&quiz.operation));
        }
    }

    #[test]
    fn test_random_ids_are_unique() {
        let mut source = RandomQuizSource::seeded(7);
        let a = source.next_quiz(Difficulty::default());
        let b = source.next_quiz(Difficulty::default());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_scripted_replays_then_repeats() {
        let mut source = ScriptedQuizzes::additions(&[(2, 3), (4, 4)]);
        assert_eq!(source.next_quiz(Difficulty::new(1)).answer, 5);
        assert_eq!(source.next_quiz(Difficulty::new(2)).id, "q2");
        let repeat = source.next_quiz(Difficulty::new(3));
        assert_eq!(repeat.id, "q2");
        assert_eq!(repeat.difficulty, Difficulty::new(3));
        assert_eq!(source.requested.len(), 3);
    }
}
