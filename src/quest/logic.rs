//! Math Quest session rules (pure functions, no DOM or storage dependency).

use super::catalog::{BlockDef, Mode, BLOCKS};
use super::problem::{generate_choices, generate_problem, pick_operation, rng_range};
use super::state::{Feedback, Session, SessionPhase, Setup};
use crate::time::{ms_to_ticks, secs_to_ticks, TICKS_PER_SEC};

pub const SESSION_SECS: u32 = 60;
pub const SESSION_TICKS: u32 = secs_to_ticks(SESSION_SECS);
pub const CORRECT_DELAY_TICKS: u32 = ms_to_ticks(600);
pub const WRONG_DELAY_TICKS: u32 = ms_to_ticks(500);

pub const MAX_INPUT_DIGITS: usize = 3;
pub const BASE_POINTS: u32 = 10;
pub const STREAK_BONUS: u32 = 2;
/// The streak badge shows once the streak exceeds this.
pub const STREAK_BADGE_AFTER: u32 = 2;
pub const REWARD_OFFERS: usize = 3;

/// Even-numbered questions are answered by picking one of four options.
pub fn is_multiple_choice(question: u32) -> bool {
    question % 2 == 0
}

pub fn points_for(streak: u32) -> u32 {
    BASE_POINTS + STREAK_BONUS * streak
}

pub fn shows_streak_badge(streak: u32) -> bool {
    streak > STREAK_BADGE_AFTER
}

pub fn start_session(setup: &Setup, seed: &mut u64) -> Session {
    let op = pick_operation(&setup.ops, seed);
    let problem = generate_problem(op, &setup.tables, seed);
    let mut session = Session {
        mode: setup.mode,
        setup: setup.clone(),
        problem,
        input: String::new(),
        choices: None,
        question: 1,
        score: 0,
        streak: 0,
        best_streak: 0,
        correct: 0,
        wrong: 0,
        ticks_left: SESSION_TICKS,
        feedback: None,
        feedback_ticks: 0,
        picked: None,
        phase: SessionPhase::Playing,
        rewards: Vec::new(),
        chosen_reward: None,
    };
    prepare_round(&mut session, seed);
    session
}

fn prepare_round(session: &mut Session, seed: &mut u64) {
    session.input.clear();
    session.picked = None;
    session.choices = if is_multiple_choice(session.question) {
        Some(generate_choices(session.problem.answer, seed))
    } else {
        None
    };
}

fn next_problem(session: &mut Session, seed: &mut u64) {
    let op = pick_operation(&session.setup.ops, seed);
    session.problem = generate_problem(op, &session.setup.tables, seed);
    session.question += 1;
    prepare_round(session, seed);
}

fn submit(session: &mut Session, value: u32) -> Feedback {
    if value == session.problem.answer {
        session.score += points_for(session.streak);
        session.streak += 1;
        session.best_streak = session.best_streak.max(session.streak);
        session.correct += 1;
        session.feedback = Some(Feedback::Correct);
        session.feedback_ticks = CORRECT_DELAY_TICKS;
        Feedback::Correct
    } else {
        session.streak = 0;
        session.wrong += 1;
        session.feedback = Some(Feedback::Wrong);
        session.feedback_ticks = WRONG_DELAY_TICKS;
        Feedback::Wrong
    }
}

/// Append a keypad digit. Submits once the input is as long as the answer.
pub fn press_digit(session: &mut Session, digit: u32) -> Option<Feedback> {
    if !session.accepts_input() || session.choices.is_some() || digit > 9 {
        return None;
    }
    if session.input.len() >= MAX_INPUT_DIGITS {
        return None;
    }
    session.input.push(char::from_digit(digit, 10)?);
    if session.input.len() < session.problem.answer_digits() {
        return None;
    }
    let value = session.input.parse::<u32>().ok()?;
    Some(submit(session, value))
}

pub fn press_delete(session: &mut Session) {
    if session.accepts_input() {
        session.input.pop();
    }
}

pub fn select_choice(session: &mut Session, index: usize) -> Option<Feedback> {
    if !session.accepts_input() {
        return None;
    }
    let value = *session.choices.as_ref()?.get(index)?;
    session.picked = Some(index);
    Some(submit(session, value))
}

/// Advance feedback and countdown timers. Returns true on the tick the
/// time-attack clock runs out.
pub fn tick(session: &mut Session, delta_ticks: u32, seed: &mut u64) -> bool {
    for _ in 0..delta_ticks {
        if session.phase != SessionPhase::Playing {
            return false;
        }

        if let Some(feedback) = session.feedback {
            session.feedback_ticks = session.feedback_ticks.saturating_sub(1);
            if session.feedback_ticks == 0 {
                session.feedback = None;
                match feedback {
                    Feedback::Correct => next_problem(session, seed),
                    Feedback::Wrong => {
                        session.input.clear();
                        session.picked = None;
                    }
                }
            }
        }

        if session.mode == Mode::TimeAttack {
            session.ticks_left = session.ticks_left.saturating_sub(1);
            if session.ticks_left == 0 {
                return true;
            }
        }
    }
    false
}

pub fn seconds_left(session: &Session) -> u32 {
    session.ticks_left.div_ceil(TICKS_PER_SEC)
}

/// Stop the session and draw the reward offers.
pub fn finish_session(session: &mut Session, seed: &mut u64) {
    if session.phase == SessionPhase::Finished {
        return;
    }
    session.phase = SessionPhase::Finished;
    session.feedback = None;
    session.rewards = offer_rewards(seed);
}

/// Three distinct blocks drawn from the catalog.
pub fn offer_rewards(seed: &mut u64) -> Vec<&'static BlockDef> {
    let mut offers: Vec<&'static BlockDef> = Vec::with_capacity(REWARD_OFFERS);
    while offers.len() < REWARD_OFFERS.min(BLOCKS.len()) {
        let block = &BLOCKS[rng_range(seed, BLOCKS.len() as u32) as usize];
        if !offers.iter().any(|b| b.kind == block.kind) {
            offers.push(block);
        }
    }
    offers
}

/// Claim one of the offers. Only the first claim counts.
pub fn choose_reward(session: &mut Session, index: usize) -> Option<&'static BlockDef> {
    if !session.is_finished() || session.chosen_reward.is_some() {
        return None;
    }
    let block = *session.rewards.get(index)?;
    session.chosen_reward = Some(index);
    Some(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quest::problem::Operation;

    fn setup(mode: Mode) -> Setup {
        let mut setup = Setup::default();
        setup.mode = mode;
        setup
    }

    fn type_answer(session: &mut Session) -> Option<Feedback> {
        let digits: Vec<u32> = session
            .problem
            .answer
            .to_string()
            .chars()
            .filter_map(|c| c.to_digit(10))
            .collect();
        let mut result = None;
        for d in digits {
            result = press_digit(session, d);
        }
        result
    }

    #[test]
    fn first_question_uses_keypad() {
        let mut seed = 1;
        let session = start_session(&setup(Mode::TimeAttack), &mut seed);
        assert_eq!(session.question, 1);
        assert!(session.choices.is_none());
        assert_eq!(session.ticks_left, SESSION_TICKS);
        assert_eq!(SESSION_TICKS, 600);
    }

    #[test]
    fn correct_answer_scores_with_streak() {
        let mut seed = 7;
        let mut session = start_session(&setup(Mode::Practice), &mut seed);
        assert_eq!(type_answer(&mut session), Some(Feedback::Correct));
        assert_eq!(session.score, 10);
        assert_eq!(session.streak, 1);

        tick(&mut session, CORRECT_DELAY_TICKS, &mut seed);
        assert_eq!(session.question, 2);
        let choices = session.choices.clone().unwrap();
        assert_eq!(choices.len(), 4);
        let index = choices
            .iter()
            .position(|&c| c == session.problem.answer)
            .unwrap();
        assert_eq!(select_choice(&mut session, index), Some(Feedback::Correct));
        assert_eq!(session.score, 10 + 12);
        assert_eq!(session.streak, 2);
    }

    #[test]
    fn input_ignored_during_feedback() {
        let mut seed = 3;
        let mut session = start_session(&setup(Mode::Practice), &mut seed);
        type_answer(&mut session);
        assert_eq!(press_digit(&mut session, 1), None);
        assert!(session.input.len() <= MAX_INPUT_DIGITS);
        tick(&mut session, CORRECT_DELAY_TICKS - 1, &mut seed);
        assert_eq!(session.question, 1);
        tick(&mut session, 1, &mut seed);
        assert_eq!(session.question, 2);
        assert!(session.feedback.is_none());
    }

    #[test]
    fn wrong_answer_resets_streak_and_keeps_problem() {
        let mut seed = 11;
        let mut session = start_session(&setup(Mode::Practice), &mut seed);
        type_answer(&mut session);
        tick(&mut session, CORRECT_DELAY_TICKS, &mut seed);
        assert_eq!(session.streak, 1);

        let problem = session.problem.clone();
        let wrong = session
            .choices
            .as_ref()
            .unwrap()
            .iter()
            .position(|&c| c != problem.answer)
            .unwrap();
        assert_eq!(select_choice(&mut session, wrong), Some(Feedback::Wrong));
        assert_eq!(session.streak, 0);
        assert_eq!(session.wrong, 1);

        tick(&mut session, WRONG_DELAY_TICKS, &mut seed);
        assert!(session.feedback.is_none());
        assert_eq!(session.problem, problem);
        assert_eq!(session.question, 2);
        assert!(session.picked.is_none());
    }

    #[test]
    fn keypad_autosubmits_at_answer_length() {
        let mut seed = 5;
        let mut session = start_session(&setup(Mode::Practice), &mut seed);
        session.problem.answer = 42;
        assert_eq!(press_digit(&mut session, 4), None);
        assert_eq!(session.input, "4");
        press_delete(&mut session);
        assert_eq!(session.input, "");
        assert_eq!(press_digit(&mut session, 4), None);
        assert_eq!(press_digit(&mut session, 3), Some(Feedback::Wrong));
        tick(&mut session, WRONG_DELAY_TICKS, &mut seed);
        assert_eq!(session.input, "");
    }

    #[test]
    fn keypad_ignored_on_multiple_choice() {
        let mut seed = 9;
        let mut session = start_session(&setup(Mode::Practice), &mut seed);
        session.question = 2;
        session.choices = Some(vec![1, 2, 3, 4]);
        assert_eq!(press_digit(&mut session, 1), None);
        assert!(session.input.is_empty());
        assert_eq!(select_choice(&mut session, 4), None);
    }

    #[test]
    fn time_attack_expires_after_sixty_seconds() {
        let mut seed = 2;
        let mut session = start_session(&setup(Mode::TimeAttack), &mut seed);
        assert!(!tick(&mut session, SESSION_TICKS - 1, &mut seed));
        assert_eq!(seconds_left(&session), 1);
        assert!(tick(&mut session, 5, &mut seed));
        assert_eq!(session.ticks_left, 0);
    }

    #[test]
    fn practice_never_expires() {
        let mut seed = 2;
        let mut session = start_session(&setup(Mode::Practice), &mut seed);
        assert!(!tick(&mut session, SESSION_TICKS * 3, &mut seed));
    }

    #[test]
    fn finishing_offers_three_distinct_rewards() {
        let mut seed = 4;
        let mut session = start_session(&setup(Mode::TimeAttack), &mut seed);
        finish_session(&mut session, &mut seed);
        assert!(session.is_finished());
        assert_eq!(session.rewards.len(), REWARD_OFFERS);
        assert_ne!(session.rewards[0].kind, session.rewards[1].kind);
        assert_ne!(session.rewards[1].kind, session.rewards[2].kind);
        assert_ne!(session.rewards[0].kind, session.rewards[2].kind);

        assert_eq!(press_digit(&mut session, 1), None);
        let first = choose_reward(&mut session, 1).map(|b| b.kind);
        assert_eq!(first, Some(session.rewards[1].kind));
        assert!(choose_reward(&mut session, 0).is_none());
    }

    #[test]
    fn rewards_require_a_finished_session() {
        let mut seed = 4;
        let mut session = start_session(&setup(Mode::Practice), &mut seed);
        assert!(choose_reward(&mut session, 0).is_none());
    }

    #[test]
    fn mixed_session_draws_from_selected_ops() {
        let mut seed = 21;
        let mut s = setup(Mode::Practice);
        s.set_ops(&[Operation::Add, Operation::Subtract]);
        let mut session = start_session(&s, &mut seed);
        for _ in 0..20 {
            assert!(matches!(
                session.problem.operation,
                Operation::Add | Operation::Subtract
            ));
            let v = session.problem.answer;
            match session.choices.clone() {
                Some(choices) => {
                    let i = choices.iter().position(|&c| c == v).unwrap();
                    select_choice(&mut session, i);
                }
                None => {
                    type_answer(&mut session);
                }
            }
            tick(&mut session, CORRECT_DELAY_TICKS, &mut seed);
        }
        assert_eq!(session.correct, 20);
        assert_eq!(session.wrong, 0);
    }

    #[test]
    fn streak_badge_threshold() {
        assert!(!shows_streak_badge(2));
        assert!(shows_streak_badge(3));
        assert_eq!(points_for(0), 10);
        assert_eq!(points_for(4), 18);
    }
}
