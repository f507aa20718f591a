use crate::Dice;

/// Result of a single probability check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChanceCheck {
    /// The uniform draw, or `None` when the outcome was certain.
    pub roll: Option<f64>,
    pub chance: f64,
    pub passed: bool,
}

/// Roll against `chance`; passes when the draw is strictly below it.
///
/// Certain outcomes (`chance >= 1` or `chance <= 0`) do not consume a draw, so
/// scripted dice only need entries for checks that can actually go either way.
pub fn chance(dice: &mut Dice, chance: f64) -> ChanceCheck {
    if chance >= 1.0 {
        return ChanceCheck {
            roll: None,
            chance,
            passed: true,
        };
    }
    if chance <= 0.0 || chance.is_nan() {
        return ChanceCheck {
            roll: None,
            chance,
            passed: false,
        };
    }
    let roll = dice.roll();
    ChanceCheck {
        roll: Some(roll),
        chance,
        passed: roll < chance,
    }
}
