//! Calendar functions.
//!
//! Every calendar read happens in one zone: the explicit zone argument if
//! it names a known zone, else the zone stored on the date, else the
//! engine's default zone.

use attrel_types::{DatePattern, DateError, DateTime, Kind, Value};
use chrono::{Datelike, Months, NaiveDateTime, TimeDelta, Timelike, Weekday};

use super::{FunctionDef, FunctionImpl, FunctionRegistry, Invocation, Param};
use crate::interpreter::EvalError;

const DATE: Param = Param::Kind(Kind::DateTime);
const INT: Param = Param::Kind(Kind::Int64);
const STR: Param = Param::Kind(Kind::Str);

const MILLIS_PER_SECOND: i64 = 1_000;
const MILLIS_PER_MINUTE: i64 = 60 * MILLIS_PER_SECOND;
const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;

fn def(
    name: &'static str,
    params: &'static [Param],
    returns: Kind,
    summary: &'static str,
    func: FunctionImpl,
) -> FunctionDef {
    FunctionDef {
        name,
        receiver: Some(DATE),
        params,
        returns: Some(returns),
        summary,
        func,
    }
}

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register(FunctionDef {
        name: "toDate",
        receiver: Some(INT),
        params: &[],
        returns: Some(Kind::DateTime),
        summary: "Date from epoch milliseconds",
        func: to_date_millis,
    });
    registry.register(FunctionDef {
        name: "toDate",
        receiver: Some(STR),
        params: &[STR],
        returns: Some(Kind::DateTime),
        summary: "Parse text strictly with a date pattern",
        func: to_date,
    });
    registry.register(FunctionDef {
        name: "toDate",
        receiver: Some(STR),
        params: &[STR, Param::Zone],
        returns: Some(Kind::DateTime),
        summary: "Parse text strictly with a date pattern in a zone",
        func: to_date,
    });

    let defs = [
        def("format", &[STR], Kind::Str, "Render with a date pattern", format),
        def("format", &[STR, Param::Zone], Kind::Str, "Render with a date pattern in a zone", format),
        def("addYears", &[INT], Kind::DateTime, "Add calendar years", add_years),
        def("addMonths", &[INT], Kind::DateTime, "Add calendar months", add_months),
        def("addWeeks", &[INT], Kind::DateTime, "Add calendar weeks", add_weeks),
        def("addDays", &[INT], Kind::DateTime, "Add calendar days", add_days),
        def("addHours", &[INT], Kind::DateTime, "Add hours of elapsed time", add_hours),
        def("addMinutes", &[INT], Kind::DateTime, "Add minutes of elapsed time", add_minutes),
        def("addSeconds", &[INT], Kind::DateTime, "Add seconds of elapsed time", add_seconds),
        def("after", &[DATE], Kind::Bool, "Strictly later instant", after),
        def("before", &[DATE], Kind::Bool, "Strictly earlier instant", before),
        def(
            "getDateForWeek",
            &[INT, INT],
            Kind::DateTime,
            "Day 1=Monday..7=Sunday of the week n weeks away",
            date_for_week,
        ),
    ];
    for def in defs {
        registry.register(def);
    }

    let getters: [(&'static str, &'static str, FunctionImpl); 16] = [
        ("getYear", "Calendar year", get_year),
        ("getMonth", "Month, 0 = January", get_month),
        ("getDayOfMonth", "Day of the month", get_day_of_month),
        ("getDayOfYear", "Day of the year", get_day_of_year),
        ("getDayOfWeek", "Day of the week, 1 = Sunday", get_day_of_week),
        ("getDayOfWeekInMonth", "Occurrence of this weekday in the month", get_day_of_week_in_month),
        ("getWeekOfMonth", "Sunday-start week of the month", get_week_of_month),
        ("getWeekOfYear", "Sunday-start week of the year", get_week_of_year),
        ("getHour", "Hour on a 12-hour clock, 0..=11", get_hour),
        ("getHourOfDay", "Hour on a 24-hour clock", get_hour_of_day),
        ("getMinute", "Minute of the hour", get_minute),
        ("getSecond", "Second of the minute", get_second),
        ("getMilliSecond", "Millisecond of the second", get_millisecond),
        ("getQuarter", "Quarter of the year, 1..=4", get_quarter),
        ("isWeekend", "Saturday or Sunday", is_weekend),
        ("toNumber", "Epoch milliseconds", to_number),
    ];
    for (name, summary, func) in getters {
        let returns = match name {
            "isWeekend" => Kind::Bool,
            _ => Kind::Int64,
        };
        registry.register(def(name, &[], returns, summary, func));
        if name != "toNumber" {
            registry.register(def(name, &[Param::Zone], returns, summary, func));
        }
    }
}

fn to_date_millis(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    match inv.value()? {
        Value::Int64(millis) => Ok(Value::DateTime(DateTime::new(*millis))),
        other => Err(EvalError::type_error("integer", other)),
    }
}

/// `toDate(pattern)` and `toDate(pattern, zone)`.
fn to_date(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    let text = inv.str_receiver()?;
    let pattern = DatePattern::compile(inv.str(0)?)?;
    let explicit = inv.zone_arg(1);
    let zone = explicit.unwrap_or(inv.config.default_zone);
    let date = DateTime::new(zone.parse_datetime(text, &pattern)?);
    Ok(Value::DateTime(match explicit {
        Some(zone) => date.with_zone(zone),
        None => date,
    }))
}

fn format(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    let date = inv.date_receiver()?;
    let pattern = DatePattern::compile(inv.str(0)?)?;
    let zone = inv.zone_for(&date, 1);
    Ok(Value::Str(zone.format(date.millis(), pattern.strftime())?))
}

/// Shift the wall-clock time of the receiver, keeping its zone tag.
fn shift_local(
    inv: &Invocation<'_>,
    shift: impl FnOnce(NaiveDateTime) -> Option<NaiveDateTime>,
) -> Result<Value, EvalError> {
    let date = inv.date_receiver()?;
    let zone = date.zone_or(inv.config.default_zone);
    let local = zone.local_datetime(date.millis())?;
    let shifted = shift(local).ok_or(DateError::OutOfRange)?;
    Ok(Value::DateTime(date.with_millis(zone.instant(&shifted)?)))
}

fn plus_months(local: NaiveDateTime, months: i64) -> Option<NaiveDateTime> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months < 0 {
        local.checked_sub_months(magnitude)
    } else {
        local.checked_add_months(magnitude)
    }
}

fn add_years(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    let months = inv.int(0)?.checked_mul(12).ok_or(DateError::OutOfRange)?;
    shift_local(inv, |local| plus_months(local, months))
}

fn add_months(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    let months = inv.int(0)?;
    shift_local(inv, |local| plus_months(local, months))
}

fn add_weeks(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    let weeks = inv.int(0)?;
    shift_local(inv, |local| local.checked_add_signed(TimeDelta::try_weeks(weeks)?))
}

fn add_days(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    let days = inv.int(0)?;
    shift_local(inv, |local| local.checked_add_signed(TimeDelta::try_days(days)?))
}

fn add_elapsed(inv: &Invocation<'_>, unit: i64) -> Result<Value, EvalError> {
    let date = inv.date_receiver()?;
    let millis = inv
        .int(0)?
        .checked_mul(unit)
        .and_then(|delta| date.millis().checked_add(delta))
        .ok_or(DateError::OutOfRange)?;
    Ok(Value::DateTime(date.with_millis(millis)))
}

fn add_hours(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    add_elapsed(inv, MILLIS_PER_HOUR)
}

fn add_minutes(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    add_elapsed(inv, MILLIS_PER_MINUTE)
}

fn add_seconds(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    add_elapsed(inv, MILLIS_PER_SECOND)
}

fn after(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(Value::Bool(inv.date_receiver()?.millis() > inv.date(0)?.millis()))
}

fn before(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(Value::Bool(inv.date_receiver()?.millis() < inv.date(0)?.millis()))
}

/// Move `weeks` weeks, then to day `day` (1 = Monday) of that week.
/// A day outside 1..=7 leaves the date alone.
fn date_for_week(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    let weeks = inv.int(0)?;
    let day = inv.int(1)?;
    if !(1..=7).contains(&day) {
        return Ok(Value::DateTime(inv.date_receiver()?));
    }
    shift_local(inv, |local| {
        let current = i64::from(local.weekday().number_from_monday());
        let days = weeks.checked_mul(7)?.checked_add(day - current)?;
        local.checked_add_signed(TimeDelta::try_days(days)?)
    })
}

/// Read one field of the receiver's wall-clock time. Argument 0, when
/// present, is a zone override.
fn field(inv: &Invocation<'_>, read: fn(&NaiveDateTime) -> i64) -> Result<Value, EvalError> {
    let date = inv.date_receiver()?;
    let local = inv.zone_for(&date, 0).local_datetime(date.millis())?;
    Ok(Value::Int64(read(&local)))
}

fn get_year(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    field(inv, |t| i64::from(t.year()))
}

fn get_month(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    field(inv, |t| i64::from(t.month0()))
}

fn get_day_of_month(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    field(inv, |t| i64::from(t.day()))
}

fn get_day_of_year(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    field(inv, |t| i64::from(t.ordinal()))
}

fn get_day_of_week(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    field(inv, |t| i64::from(t.weekday().number_from_sunday()))
}

fn get_day_of_week_in_month(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    field(inv, |t| i64::from((t.day() - 1) / 7 + 1))
}

fn get_week_of_month(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    field(inv, week_of_month)
}

fn get_week_of_year(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    field(inv, week_of_year)
}

fn get_hour(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    field(inv, |t| i64::from(t.hour() % 12))
}

fn get_hour_of_day(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    field(inv, |t| i64::from(t.hour()))
}

fn get_minute(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    field(inv, |t| i64::from(t.minute()))
}

fn get_second(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    field(inv, |t| i64::from(t.second()))
}

fn get_millisecond(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    // leap seconds carry nanoseconds past 1e9
    field(inv, |t| i64::from(t.nanosecond() / 1_000_000 % 1_000))
}

fn get_quarter(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    field(inv, |t| i64::from(t.month0() / 3 + 1))
}

fn is_weekend(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    let date = inv.date_receiver()?;
    let local = inv.zone_for(&date, 0).local_datetime(date.millis())?;
    Ok(Value::Bool(matches!(local.weekday(), Weekday::Sat | Weekday::Sun)))
}

fn to_number(inv: &Invocation<'_>) -> Result<Value, EvalError> {
    Ok(Value::Int64(inv.date_receiver()?.millis()))
}

/// Sunday-start weeks; week 1 holds the first of the month.
fn week_of_month(t: &NaiveDateTime) -> i64 {
    let first_offset = i64::from(t.weekday().num_days_from_sunday()) - i64::from(t.day() - 1) % 7;
    let first_offset = first_offset.rem_euclid(7);
    (i64::from(t.day()) - 1 + first_offset) / 7 + 1
}

/// Sunday-start weeks; week 1 holds January 1st. The week that holds the
/// next January 1st is already week 1.
fn week_of_year(t: &NaiveDateTime) -> i64 {
    let weekday = i64::from(t.weekday().num_days_from_sunday());
    if t.month() == 12 && i64::from(t.day()) + (6 - weekday) > 31 {
        return 1;
    }
    let ordinal = i64::from(t.ordinal());
    let jan1_offset = (weekday - (ordinal - 1)).rem_euclid(7);
    (ordinal - 1 + jan1_offset) / 7 + 1
}
