use almanac_calendar::{
    Anchor, Calendar, Index, Role, Span, daily_calendar, date_range, monthly_calendar,
};
use almanac_resample::{Reducer, ResampleConfig, ResampleWarning, Series, resample};
use approx::assert_relative_eq;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use ndarray::IxDyn;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_time(NaiveTime::MIN)
}

fn weekly_calendar() -> Calendar {
    let mut calendar = Calendar::new("12-31".parse::<Anchor>().unwrap());
    calendar
        .add_interval("target", Role::Target, Span::days(7), Span::ZERO)
        .unwrap()
        .add_intervals(Role::Precursor, Span::days(7), Span::ZERO, 3)
        .unwrap();
    calendar
}

#[test]
fn empty_cells_are_nan_and_warned_once() {
    // daily data over 2019-2020 with a hole from 2020-12-10 to 2020-12-17
    let times: Vec<NaiveDateTime> = date_range(ymd(2019, 1, 1), ymd(2020, 12, 31), Span::days(1))
        .unwrap()
        .datetimes()
        .unwrap()
        .iter()
        .copied()
        .filter(|t| !(ymd(2020, 12, 10)..=ymd(2020, 12, 17)).contains(t))
        .collect();
    let n = times.len();
    let series = Series::new(times, vec![1.0; n]).unwrap();
    let table = weekly_calendar().realize_range(2019, 2020).unwrap();

    let frame = resample(&table, &series, &Reducer::default(), &ResampleConfig::new()).unwrap();
    assert_eq!(frame.warnings(), &[ResampleWarning::MissingData { n_empty: 1 }]);

    let data = frame.variables()[0].data();
    // 2020 t-2 = (12-10, 12-17]
    assert!(data[IxDyn(&[0, 2])].is_nan());
    assert_relative_eq!(data[IxDyn(&[0, 1])], 1.0);
    assert_relative_eq!(data[IxDyn(&[1, 2])], 1.0);
}

#[test]
fn nan_samples_are_not_missing_cells() {
    let index = date_range(ymd(2020, 1, 1), ymd(2020, 12, 31), Span::days(1)).unwrap();
    let n = index.len();
    let series = Series::new(index, vec![f64::NAN; n]).unwrap();
    let table = weekly_calendar().realize_range(2020, 2020).unwrap();
    let frame = resample(&table, &series, &Reducer::default(), &ResampleConfig::new()).unwrap();
    assert!(frame.warnings().is_empty());
    assert!(frame.variables()[0].data().iter().all(|v| v.is_nan()));
}

#[test]
fn negative_gap_intervals_share_samples() {
    let mut calendar = Calendar::new("12-31".parse::<Anchor>().unwrap());
    calendar
        .add_interval("target", Role::Target, Span::days(10), Span::ZERO)
        .unwrap()
        .add_interval("precursor", Role::Precursor, Span::days(10), Span::days(-5))
        .unwrap();
    let index = date_range(ymd(2020, 1, 1), ymd(2020, 12, 31), Span::days(1)).unwrap();
    let values: Vec<f64> = index
        .datetimes()
        .unwrap()
        .iter()
        .map(|t| (*t - ymd(2020, 1, 1)).num_days() as f64)
        .collect();
    let series = Series::new(index, values).unwrap();
    let table = calendar.realize_range(2020, 2020).unwrap();

    let frame = resample(&table, &series, &Reducer::default(), &ResampleConfig::new()).unwrap();
    let data = frame.variables()[0].data();
    // t-0 = (12-21, 12-31] -> day numbers 356..=365
    assert_relative_eq!(data[IxDyn(&[0, 0])], 360.5);
    // t-1 = (12-16, 12-26] -> day numbers 351..=360
    assert_relative_eq!(data[IxDyn(&[0, 1])], 355.5);
}

#[test]
fn low_frequency_warning() {
    // 3-day intervals on 2-day data
    let calendar = daily_calendar("12-31".parse::<Anchor>().unwrap(), 3, 1, Some(2)).unwrap();
    let index = date_range(ymd(2019, 1, 1), ymd(2020, 12, 31), Span::days(2)).unwrap();
    let n = index.len();
    let series = Series::new(index, vec![0.0; n]).unwrap();
    let table = calendar.realize_range(2019, 2020).unwrap();

    let frame = resample(&table, &series, &Reducer::default(), &ResampleConfig::new()).unwrap();
    assert!(frame.warnings().contains(&ResampleWarning::LowFrequency {
        shortest: TimeDelta::days(3),
        step: TimeDelta::days(2),
        tolerance: 2.0,
    }));

    let relaxed = ResampleConfig::new().with_low_frequency_tolerance(1.0);
    let frame = resample(&table, &series, &Reducer::default(), &relaxed).unwrap();
    assert!(
        !frame
            .warnings()
            .iter()
            .any(|w| matches!(w, ResampleWarning::LowFrequency { .. }))
    );
}

#[test]
fn monthly_calendar_on_monthly_samples() {
    let calendar = monthly_calendar("Dec".parse::<Anchor>().unwrap(), 1, 1, Some(11)).unwrap();
    let index = date_range(ymd(2010, 1, 1), ymd(2020, 12, 1), Span::months(1)).unwrap();
    let n = index.len();
    let table = calendar.realize_for_data(&index).unwrap();
    let series = Series::new(index, (0..n).map(|i| i as f64).collect()).unwrap();

    let frame = resample(&table, &series, &Reducer::default(), &ResampleConfig::new()).unwrap();
    assert_eq!(frame.anchor_years().to_vec(), (2011..=2020).rev().collect::<Vec<_>>());
    // one sample per month, labelled by its position in the index
    let data = frame.variables()[0].data();
    assert_relative_eq!(data[IxDyn(&[0, 0])], 131.0);
    assert_relative_eq!(data[IxDyn(&[9, 11])], 12.0);
    assert!(data.iter().all(|v| !v.is_nan()));

    // February is 28 days against a median gap of 31
    assert_eq!(
        frame.warnings(),
        &[ResampleWarning::LowFrequency {
            shortest: TimeDelta::days(28),
            step: TimeDelta::days(31),
            tolerance: 2.0,
        }]
    );
}

#[test]
fn single_sample_skips_frequency_check() {
    let series = Series::new(Index::from(vec![ymd(2020, 12, 30)]), vec![4.0]).unwrap();
    let calendar = daily_calendar("12-31".parse::<Anchor>().unwrap(), 1, 1, Some(0)).unwrap();
    let table = calendar.realize_range(2020, 2020).unwrap();
    let frame = resample(&table, &series, &Reducer::default(), &ResampleConfig::new()).unwrap();
    // (12-30, 12-31] excludes the sample on its left edge
    assert!(frame.variables()[0].data()[IxDyn(&[0, 0])].is_nan());
    assert_eq!(frame.warnings(), &[ResampleWarning::MissingData { n_empty: 1 }]);
}
