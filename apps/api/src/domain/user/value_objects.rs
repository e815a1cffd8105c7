use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::geography;

/// Mozambican mobile number in E.164 form.
///
/// # Invariants
/// - Starts with `+258`
/// - Followed by exactly 9 ASCII digits
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    /// Creates a new Phone value object
    ///
    /// # Example
    /// ```
    /// use permuta_api::domain::user::value_objects::Phone;
    ///
    /// let phone = Phone::new("+258841234567").expect("valid phone");
    /// assert_eq!(phone.as_str(), "+258841234567");
    /// assert!(Phone::new("841234567").is_err());
    /// ```
    pub fn new(phone: impl Into<String>) -> Result<Self, String> {
        let phone = phone.into();
        if Self::is_valid(&phone) {
            Ok(Phone(phone))
        } else {
            Err(format!(
                "Invalid phone number: {} (expected +258XXXXXXXXX)",
                phone
            ))
        }
    }

    fn is_valid(phone: &str) -> bool {
        phone
            .strip_prefix("+258")
            .is_some_and(|rest| rest.len() == 9 && rest.bytes().all(|b| b.is_ascii_digit()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Phone {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Phone::new(value)
    }
}

impl From<Phone> for String {
    fn from(phone: Phone) -> Self {
        phone.0
    }
}

/// Email value object representing a valid email address
///
/// # Invariants
/// - Must contain '@' character
/// - Must be at least 3 characters long
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    pub fn new(email: impl Into<String>) -> Result<Self, String> {
        let email = email.into();
        if Self::is_valid(&email) {
            Ok(Email(email))
        } else {
            Err(format!("Invalid email: {}", email))
        }
    }

    /// Parses an optional form field; an empty string means "no email".
    pub fn parse_optional(email: Option<&str>) -> Result<Option<Self>, String> {
        match email.map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => Email::new(value).map(Some),
        }
    }

    fn is_valid(email: &str) -> bool {
        email.contains('@') && email.len() >= 3
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Salary level on the public-service scale, 1 through 21.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct SalaryLevel(u8);

impl SalaryLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 21;

    pub fn new(level: i64) -> Result<Self, String> {
        if (Self::MIN as i64..=Self::MAX as i64).contains(&level) {
            Ok(SalaryLevel(level as u8))
        } else {
            Err(format!(
                "Salary level must be between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                level
            ))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for SalaryLevel {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        SalaryLevel::new(value)
    }
}

impl From<SalaryLevel> for i64 {
    fn from(level: SalaryLevel) -> Self {
        level.0 as i64
    }
}

impl fmt::Display for SalaryLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Grade (escalão) within a salary level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
}

impl Grade {
    pub fn as_str(self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
        }
    }
}

impl FromStr for Grade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Grade::A),
            "B" => Ok(Grade::B),
            "C" => Ok(Grade::C),
            other => Err(format!("Invalid grade: {} (expected A, B or C)", other)),
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public-sector area a user works in. Fixed at registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Sector(String);

impl Sector {
    pub fn new(sector: impl Into<String>) -> Result<Self, String> {
        let sector = sector.into();
        if geography::is_known_sector(&sector) {
            Ok(Sector(sector))
        } else {
            Err(format!("Unknown sector: {}", sector))
        }
    }

    /// Rebuilds a sector read back from storage without re-validating it.
    pub fn from_persistence(sector: String) -> Self {
        Sector(sector)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A province and one of its districts, always set together.
///
/// # Invariants
/// - The province is a known Mozambique province
/// - The district belongs to that province
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    province: String,
    district: String,
}

impl Location {
    /// Creates a location from a province and district pair.
    ///
    /// # Example
    /// ```
    /// use permuta_api::domain::user::value_objects::Location;
    ///
    /// let beira = Location::new("Sofala", "Beira").expect("valid location");
    /// assert_eq!(beira.province(), "Sofala");
    /// assert!(Location::new("Sofala", "Matola").is_err());
    /// ```
    pub fn new(province: impl Into<String>, district: impl Into<String>) -> Result<Self, String> {
        let province = province.into();
        let district = district.into();

        if !geography::is_known_province(&province) {
            return Err(format!("Unknown province: {}", province));
        }
        if !geography::district_belongs_to(&province, &district) {
            return Err(format!(
                "District {} does not belong to province {}",
                district, province
            ));
        }

        Ok(Self { province, district })
    }

    /// Builds a location from form input where the district may be missing.
    ///
    /// Changing the province without re-selecting a district is an
    /// incomplete edit and is rejected.
    pub fn from_parts(province: &str, district: Option<&str>) -> Result<Self, String> {
        match district.map(str::trim) {
            None | Some("") => Err(format!(
                "Incomplete location: a district of {} must be selected",
                province
            )),
            Some(district) => Location::new(province.trim(), district),
        }
    }

    /// Rebuilds a location read back from storage.
    ///
    /// Bypasses the district lookup since rows were validated on write.
    pub fn from_persistence(province: String, district: String) -> Self {
        Self { province, district }
    }

    pub fn province(&self) -> &str {
        &self.province
    }

    pub fn district(&self) -> &str {
        &self.district
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}, {}", self.district, self.province)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_phone() {
        assert!(Phone::new("+258841234567").is_ok());
    }

    #[test]
    fn phone_without_country_code() {
        assert!(Phone::new("841234567").is_err());
    }

    #[test]
    fn phone_wrong_length() {
        assert!(Phone::new("+25884123456").is_err());
        assert!(Phone::new("+2588412345678").is_err());
    }

    #[test]
    fn phone_with_letters() {
        assert!(Phone::new("+25884123456x").is_err());
    }

    #[test]
    fn valid_email() {
        assert!(Email::new("test@example.com").is_ok());
    }

    #[test]
    fn invalid_email_no_at_symbol() {
        assert!(Email::new("invalid").is_err());
    }

    #[test]
    fn optional_email_blank_is_none() {
        assert_eq!(Email::parse_optional(Some("")).unwrap(), None);
        assert_eq!(Email::parse_optional(None).unwrap(), None);
        assert!(Email::parse_optional(Some("nope")).is_err());
    }

    #[test]
    fn salary_level_bounds() {
        assert!(SalaryLevel::new(1).is_ok());
        assert!(SalaryLevel::new(21).is_ok());
        assert!(SalaryLevel::new(0).is_err());
        assert!(SalaryLevel::new(22).is_err());
    }

    #[test]
    fn grade_parse() {
        assert_eq!("B".parse::<Grade>().unwrap(), Grade::B);
        assert!("D".parse::<Grade>().is_err());
        assert_eq!(Grade::C.to_string(), "C");
    }

    #[test]
    fn sector_must_be_known() {
        assert!(Sector::new("Educação").is_ok());
        assert!(Sector::new("Pesca").is_err());
    }

    #[test]
    fn location_requires_matching_district() {
        assert!(Location::new("Gaza", "Xai-Xai").is_ok());
        assert!(Location::new("Gaza", "Beira").is_err());
    }

    #[test]
    fn province_change_without_district_is_incomplete() {
        let err = Location::from_parts("Gaza", None).unwrap_err();
        assert!(err.contains("Incomplete"));
        assert!(Location::from_parts("Gaza", Some("  ")).is_err());
        assert!(Location::from_parts("Gaza", Some("Chibuto")).is_ok());
    }

    #[test]
    fn location_display() {
        let location = Location::new("Sofala", "Beira").unwrap();
        assert_eq!(location.to_string(), "Beira, Sofala");
    }
}
