use jiff::civil::{Date, Weekday, date};

use caretracker_core::dates::{
    DateFormat, ViewMode, days_between, format_date, format_timestamp_stamp, parse_date,
    quarter_of, same_quarter, weeks_for_month,
};

const FORMATS: [DateFormat; 3] = [DateFormat::Backend, DateFormat::Url, DateFormat::Visual];

#[test]
fn formats_use_expected_layouts() {
    let d = date(2024, 3, 7);
    assert_eq!(format_date(d, DateFormat::Backend), "2024-03-07");
    assert_eq!(format_date(d, DateFormat::Url), "07-03-2024");
    assert_eq!(format_date(d, DateFormat::Visual), "07.03.2024");
}

#[test]
fn every_format_round_trips() {
    let samples = [
        date(2024, 2, 29),
        date(1999, 12, 31),
        date(2000, 1, 1),
        date(2025, 7, 15),
    ];
    for d in samples {
        for f in FORMATS {
            let text = format_date(d, f);
            assert_eq!(parse_date(&text, f).unwrap(), d, "{text}");
        }
    }
}

#[test]
fn parse_rejects_wrong_layout() {
    assert!(parse_date("07.03.2024", DateFormat::Backend).is_err());
    assert!(parse_date("2024-02-30", DateFormat::Backend).is_err());
    assert!(parse_date("", DateFormat::Visual).is_err());
}

#[test]
fn timestamp_stamp_layout() {
    let at = date(2024, 11, 5).at(9, 4, 0, 0);
    assert_eq!(format_timestamp_stamp(at), "05-11-2024-09:04");
}

#[test]
fn month_grid_has_full_weeks_and_every_day() {
    for month in 1..=12 {
        let d = date(2024, month, 15);
        for start in [Weekday::Monday, Weekday::Sunday] {
            let weeks = weeks_for_month(d, start);
            assert_eq!(weeks.len(), 6);
            for week in &weeks {
                assert_eq!(week[0].weekday(), start);
            }
            let all: Vec<Date> = weeks.iter().flatten().copied().collect();
            for day in days_between(d.first_of_month(), d.last_of_month()) {
                assert!(all.contains(&day), "missing {day}");
            }
        }
    }
}

#[test]
fn month_grid_starting_monday_pads_previous_month() {
    // 1 May 2024 is a Wednesday.
    let weeks = weeks_for_month(date(2024, 5, 1), Weekday::Monday);
    assert_eq!(weeks[0][0], date(2024, 4, 29));
    assert_eq!(weeks[0][2], date(2024, 5, 1));
}

#[test]
fn range_start_per_view_mode() {
    let end = date(2024, 5, 20);
    assert_eq!(ViewMode::Daily.range_start(end), end);
    assert_eq!(ViewMode::Monthly.range_start(end), date(2024, 4, 20));
    assert_eq!(ViewMode::Quarterly.range_start(end), date(2024, 2, 20));
    assert_eq!(ViewMode::Monthly.range_start(date(2024, 3, 31)), date(2024, 2, 29));
}

#[test]
fn view_mode_parses_known_names_only() {
    assert_eq!("monthly".parse::<ViewMode>().unwrap(), ViewMode::Monthly);
    assert!("weekly".parse::<ViewMode>().is_err());
}

#[test]
fn quarters() {
    assert_eq!(quarter_of(date(2024, 1, 1)), 1);
    assert_eq!(quarter_of(date(2024, 6, 30)), 2);
    assert_eq!(quarter_of(date(2024, 7, 1)), 3);
    assert_eq!(quarter_of(date(2024, 12, 31)), 4);
    assert!(same_quarter(date(2024, 4, 1), date(2024, 6, 15)));
    assert!(!same_quarter(date(2023, 4, 1), date(2024, 4, 1)));
}

#[test]
fn days_between_is_inclusive() {
    let days: Vec<Date> = days_between(date(2024, 2, 27), date(2024, 3, 1)).collect();
    assert_eq!(days.len(), 4);
    assert_eq!(days_between(date(2024, 3, 2), date(2024, 3, 1)).count(), 0);
}
