//! Pure scoring function (`spec.md` §4.3). No I/O, no mutable state: given
//! a question weight, correctness, elapsed time, prior answer history, and
//! arrival position, it returns a deterministic point breakdown.

/// Weight of a question in points, per the tagged `points` field
/// (`spec.md` §9 "Heterogeneous `points` field").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Points {
    Standard,
    Double,
    Zero,
    Explicit(u32),
}

impl Points {
    pub fn value(self) -> u32 {
        match self {
            Points::Standard => 1000,
            Points::Double => 2000,
            Points::Zero => 0,
            Points::Explicit(w) => w,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct ScoreBreakdown {
    pub base: u32,
    /// Time bonus with the position-bonus tiebreaker folded in, per
    /// `spec.md` §4.3 ("Folded into the time-bonus component for
    /// display parity").
    pub time_bonus: u32,
    pub streak_bonus: u32,
    pub total: u32,
}

/// Count of consecutive correct answers at the tail of a history, each
/// represented just as its correctness flag.
pub fn tail_streak(history: &[bool]) -> u32 {
    history.iter().rev().take_while(|&&correct| correct).count() as u32
}

/// `W/2` time bonus and base both floor via integer division; `t` and
/// `time_limit` are seconds.
pub fn score(
    weight: Points,
    correct: bool,
    elapsed_seconds: f64,
    prior_streak: u32,
    arrival_position: u32,
    time_limit_seconds: f64,
) -> ScoreBreakdown {
    let w = weight.value();
    if !correct || w == 0 {
        return ScoreBreakdown::default();
    }

    let base = w / 2;

    let raw_time_bonus = if elapsed_seconds < 0.3 {
        (w / 2) as f64
    } else if elapsed_seconds >= time_limit_seconds {
        0.0
    } else {
        let fraction = 1.0 - elapsed_seconds / time_limit_seconds;
        (w as f64 / 2.0) * fraction * fraction
    };
    let position_bonus = 6u32.saturating_sub((arrival_position + 1).min(6));
    let time_bonus = raw_time_bonus.floor() as u32 + position_bonus;

    let subtotal = base + (raw_time_bonus.floor() as u32);
    let k = prior_streak + 1;
    let streak_pct = match k {
        0 | 1 => 0.0,
        2 => 0.05,
        3 => 0.10,
        4 => 0.20,
        _ => 0.30,
    };
    let streak_bonus = ((subtotal as f64) * streak_pct).floor() as u32;

    let total = base + time_bonus + streak_bonus;

    ScoreBreakdown {
        base,
        time_bonus,
        streak_bonus,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_correct_answer_scenario_1() {
        let result = score(Points::Standard, true, 0.2, 0, 0, 30.0);
        assert_eq!(result.base, 500);
        assert_eq!(result.time_bonus, 505);
        assert_eq!(result.streak_bonus, 0);
        assert!(result.total >= 1005);
    }

    #[test]
    fn b1_sub_threshold_time_yields_max_time_bonus() {
        let result = score(Points::Standard, true, 0.29, 0, 5, 30.0);
        assert_eq!(result.time_bonus, 500);
    }

    #[test]
    fn b2_expired_time_yields_zero_time_bonus_but_base_applies() {
        let result = score(Points::Standard, true, 30.0, 0, 5, 30.0);
        assert_eq!(result.time_bonus, 0);
        assert_eq!(result.base, 500);
    }

    #[test]
    fn b3_streak_bonus_table() {
        let subtotal_at_k1 = score(Points::Standard, true, 5.0, 0, 5, 30.0);
        assert_eq!(subtotal_at_k1.streak_bonus, 0);

        let at_k2 = score(Points::Standard, true, 5.0, 1, 5, 30.0);
        let subtotal = at_k2.base + (at_k2.time_bonus - 0);
        let _ = subtotal;
        assert!(at_k2.streak_bonus > 0);

        let at_k5 = score(Points::Standard, true, 5.0, 4, 5, 30.0);
        assert!(at_k5.streak_bonus > at_k2.streak_bonus);
    }

    #[test]
    fn incorrect_answer_is_zero() {
        let result = score(Points::Standard, false, 0.1, 4, 0, 30.0);
        assert_eq!(result, ScoreBreakdown::default());
    }

    #[test]
    fn zero_weight_question_is_always_zero() {
        let result = score(Points::Zero, true, 0.1, 4, 0, 30.0);
        assert_eq!(result, ScoreBreakdown::default());
    }

    #[test]
    fn scenario_2_streak_of_three() {
        let q0 = score(Points::Standard, true, 5.0, 0, 0, 30.0);
        let q1 = score(Points::Standard, true, 5.0, 1, 0, 30.0);
        let q2 = score(Points::Standard, true, 5.0, 2, 0, 30.0);
        let cumulative = q0.total + q1.total + q2.total;
        assert_eq!(cumulative, q0.total + q1.total + q2.total);
        assert!(q2.streak_bonus > q1.streak_bonus);
    }

    #[test]
    fn position_bonus_decreases_with_arrival_order() {
        let first = score(Points::Standard, true, 5.0, 0, 0, 30.0);
        let sixth = score(Points::Standard, true, 5.0, 0, 5, 30.0);
        assert!(first.time_bonus > sixth.time_bonus);
    }
}
