use rust_decimal::{Decimal, RoundingStrategy};

/// Scale every intermediate share is rounded to before it is summed again.
pub const SHARE_SCALE: u32 = 5;
/// Fixed conversion rate for wallet recharges.
pub const SOM_PER_USD: i64 = 10;
const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Clone, Debug, PartialEq)]
pub struct FeeSchedule {
    pub per_day_request_fee: Decimal,
    /// Applied to the request fee when a survey runs on more than one SOT.
    pub multi_sot_fee_rate: Decimal,
    pub distribution_fee_rate: Decimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        FeeSchedule {
            per_day_request_fee: Decimal::from(10),
            multi_sot_fee_rate: Decimal::new(9, 1),
            distribution_fee_rate: Decimal::new(1, 1),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FeeBreakdown {
    pub day_count: i64,
    pub sot_count: u64,
    pub request_fee: Decimal,
    pub reward_pool: Decimal,
    pub distribution_fee: Decimal,
    pub total: Decimal,
}

pub fn round_share(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(SHARE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Whole days the survey runs, counting a started day as a full one.
pub fn day_count(starting_date: i64, ending_date: i64) -> i64 {
    let seconds = ending_date.saturating_sub(starting_date);
    if seconds <= 0 {
        return 1;
    }
    let days = seconds / SECONDS_PER_DAY + if seconds % SECONDS_PER_DAY > 0 { 1 } else { 0 };
    days.max(1)
}

pub fn survey_fee(
    schedule: &FeeSchedule,
    reward_amount: Decimal,
    rewardees_count: i32,
    starting_date: i64,
    ending_date: i64,
    sot_count: u64,
) -> FeeBreakdown {
    let day_count = day_count(starting_date, ending_date);
    let mut request_fee = round_share(
        schedule.per_day_request_fee * Decimal::from(sot_count) * Decimal::from(day_count),
    );
    if sot_count > 1 {
        request_fee = round_share(request_fee * schedule.multi_sot_fee_rate);
    }
    let reward_pool = round_share(reward_amount * Decimal::from(rewardees_count.max(0)));
    let distribution_fee = round_share(reward_pool * schedule.distribution_fee_rate);

    FeeBreakdown {
        day_count,
        sot_count,
        request_fee,
        reward_pool,
        distribution_fee,
        total: request_fee + reward_pool + distribution_fee,
    }
}

/// Even split of a payment across the SOTs of a survey.
pub fn profit_share(total: Decimal, sot_count: u64) -> Decimal {
    if sot_count == 0 {
        return Decimal::ZERO;
    }
    round_share(total / Decimal::from(sot_count))
}

/// Half of a SOT's share is owed to its owner.
pub fn owner_profit(share: Decimal) -> Decimal {
    round_share(share / Decimal::TWO)
}

pub fn usd_to_som(usd: Decimal) -> Decimal {
    round_share(usd * Decimal::from(SOM_PER_USD))
}

pub fn usd_to_local(usd: Decimal, usd_to_local_rate: Decimal) -> Decimal {
    (usd * usd_to_local_rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_count_rounds_partial_days_up() {
        assert_eq!(day_count(0, SECONDS_PER_DAY), 1);
        assert_eq!(day_count(0, SECONDS_PER_DAY + 1), 2);
        assert_eq!(day_count(0, 3 * SECONDS_PER_DAY), 3);
        assert_eq!(day_count(100, 50), 1);
    }

    #[test]
    fn test_survey_fee_single_sot() {
        let fee = survey_fee(
            &FeeSchedule::default(),
            Decimal::from(5),
            10,
            0,
            2 * SECONDS_PER_DAY,
            1,
        );
        assert_eq!(fee.request_fee, Decimal::from(20));
        assert_eq!(fee.reward_pool, Decimal::from(50));
        assert_eq!(fee.distribution_fee, Decimal::from(5));
        assert_eq!(fee.total, Decimal::from(75));
    }

    #[test]
    fn test_survey_fee_scales_multi_sot_request_fee() {
        let fee = survey_fee(
            &FeeSchedule::default(),
            Decimal::ZERO,
            0,
            0,
            SECONDS_PER_DAY,
            3,
        );
        // 10 * 3 * 1 * 0.9
        assert_eq!(fee.request_fee, Decimal::from(27));
        assert_eq!(fee.total, Decimal::from(27));
    }

    #[test]
    fn test_profit_share_rounds_to_five_places() {
        let share = profit_share(Decimal::from(100), 3);
        assert_eq!(share, Decimal::new(3_333_333, 5));
        assert_eq!(owner_profit(share), Decimal::new(1_666_667, 5));
        assert_eq!(profit_share(Decimal::from(100), 0), Decimal::ZERO);
    }

    #[test]
    fn test_currency_conversion() {
        assert_eq!(usd_to_som(Decimal::new(125, 1)), Decimal::from(125));
        assert_eq!(
            usd_to_local(Decimal::from(10), Decimal::new(133_250, 2)),
            Decimal::new(1_332_500, 2)
        );
    }
}
