use aqmindp_node::{
    evaluate, policy::evaluate_fan, policy::indicator_for_aqi, ActuatorCommand, ActuatorKind,
    FanState, IndicatorColor, ThresholdConfig,
};
use aqmindp_sensor::Reading;
use proptest::prelude::*;

fn metric() -> impl Strategy<Value = Option<i32>> {
    proptest::option::of(0..=70_000i32)
}

fn thresholds() -> impl Strategy<Value = ThresholdConfig> {
    (1..=1_000i32, 400..=5_000i32, 1..=5i32).prop_map(|(tvoc_limit, eco2_limit, aqi_limit)| {
        ThresholdConfig {
            tvoc_limit,
            eco2_limit,
            aqi_limit,
        }
    })
}

fn reading(tvoc: Option<i32>, eco2: Option<i32>, aqi: Option<i32>) -> Reading {
    Reading {
        tvoc,
        eco2,
        aqi,
        ..Reading::default()
    }
}

const KNOWN: [IndicatorColor; 5] = [
    IndicatorColor::EXCELLENT,
    IndicatorColor::GOOD,
    IndicatorColor::MODERATE,
    IndicatorColor::POOR,
    IndicatorColor::UNHEALTHY,
];

proptest! {
    #[test]
    fn absent_data_never_runs_the_fan(
        t in thresholds(),
        temperature in proptest::option::of(-40.0f32..85.0),
    ) {
        let r = Reading { temperature, ..Reading::default() };
        prop_assert_eq!(evaluate_fan(&r, &t), FanState::OFF);
    }

    #[test]
    fn fan_is_monotonic_in_each_metric(
        t in thresholds(),
        tvoc in metric(),
        eco2 in metric(),
        aqi in metric(),
        bump in 0..=10_000i32,
    ) {
        let before = evaluate_fan(&reading(tvoc, eco2, aqi), &t);
        let raised = [
            reading(tvoc.map(|v| v + bump), eco2, aqi),
            reading(tvoc, eco2.map(|v| v + bump), aqi),
            reading(tvoc, eco2, aqi.map(|v| v + bump)),
        ];
        for r in raised {
            if before.on {
                prop_assert!(evaluate_fan(&r, &t).on);
            }
        }
    }

    #[test]
    fn fan_matches_limit_rule(
        t in thresholds(),
        tvoc in metric(),
        eco2 in metric(),
        aqi in metric(),
    ) {
        let expected = tvoc.map_or(false, |v| v >= t.tvoc_limit)
            || eco2.map_or(false, |v| v >= t.eco2_limit)
            || aqi.map_or(false, |v| v >= t.aqi_limit);
        prop_assert_eq!(
            evaluate(&reading(tvoc, eco2, aqi), &t, ActuatorKind::Fan),
            ActuatorCommand::Fan(FanState { on: expected })
        );
    }

    #[test]
    fn indicator_is_total(aqi in any::<i32>()) {
        let color = indicator_for_aqi(Some(aqi));
        if (1..=5).contains(&aqi) {
            prop_assert_eq!(color, KNOWN[(aqi - 1) as usize]);
        } else {
            prop_assert_eq!(color, IndicatorColor::UNKNOWN);
        }
    }
}
