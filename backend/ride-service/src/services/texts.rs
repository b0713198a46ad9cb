//! User-facing text: notification wording and route-name normalisation.

use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

static CITY_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.,\- |]").expect("city separator pattern is valid"));

/// `01.06.24 14:35`
pub fn format_datetime(at: NaiveDateTime) -> String {
    at.format("%d.%m.%y %H:%M").to_string()
}

/// Lowercases, then capitalises the first letter of every alphabetic run
pub fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_word = false;
    for ch in input.chars() {
        if ch.is_alphabetic() {
            if in_word {
                out.extend(ch.to_lowercase());
            } else {
                out.extend(ch.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(ch);
            in_word = false;
        }
    }
    out
}

/// LIKE pattern matching routes that pass through the given cities in order
pub fn search_pattern(route: &str) -> String {
    let titled = title_case(route);
    let cities: Vec<&str> = CITY_SEPARATORS
        .split(&titled)
        .filter(|city| !city.is_empty())
        .collect();
    format!("%{}%", cities.join("%"))
}

pub fn passenger_joined(name: &str, phone: &str, route: &str, at: NaiveDateTime) -> String {
    format!(
        "Пасажир {name}, {phone} долучився до маршруту '{route}' {}.",
        format_datetime(at)
    )
}

pub fn booking_cancelled(name: &str, phone: &str, route: &str, at: NaiveDateTime) -> String {
    format!(
        "Пасажир {name}, {phone} відмінив бронювання '{route}', {}",
        format_datetime(at)
    )
}

pub fn route_cancelled(route: &str, at: NaiveDateTime) -> String {
    format!("Водій відмінив маршрут '{route}', {}", format_datetime(at))
}

pub fn passenger_removed(route: &str, at: NaiveDateTime) -> String {
    format!(
        "Водій вилучив вас з маршруту '{route}' на {}.",
        format_datetime(at)
    )
}

pub fn route_offered(route: &str, at: NaiveDateTime) -> String {
    format!(
        "Вам відправлена пропозиція маршруту '{route}' на {}.",
        format_datetime(at)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(14, 35, 0)
            .unwrap()
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("київ - львів"), "Київ - Львів");
        assert_eq!(title_case("IVANO-FRANKIVSK"), "Ivano-Frankivsk");
    }

    #[test]
    fn test_search_pattern() {
        assert_eq!(search_pattern("київ, львів"), "%Київ%Львів%");
        assert_eq!(search_pattern("Київ-Житомир.Рівне"), "%Київ%Житомир%Рівне%");
        assert_eq!(search_pattern("  одеса  "), "%Одеса%");
    }

    #[test]
    fn test_notification_wording() {
        assert_eq!(
            route_cancelled("Київ - Львів", at()),
            "Водій відмінив маршрут 'Київ - Львів', 01.06.24 14:35"
        );
        assert_eq!(
            passenger_joined("Лена", "+380994473991", "Київ - Львів", at()),
            "Пасажир Лена, +380994473991 долучився до маршруту 'Київ - Львів' 01.06.24 14:35."
        );
    }
}
