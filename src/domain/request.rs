//! Prediction request schema.
//!
//! The sixteen survey fields are deserialized into typed values at the HTTP
//! boundary. Enum fields only accept their exact choice strings, so an unknown
//! value fails deserialization the same way a missing field does.

use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;

/// Number of features the classifier consumes.
pub const NUM_FEATURES: usize = 16;

/// Column order the classifier was trained on.
pub const FEATURE_ORDER: [&str; NUM_FEATURES] = [
    "Gender",
    "Age",
    "Height",
    "Weight",
    "family_history_with_overweight",
    "FAVC",
    "FCVC",
    "NCP",
    "CAEC",
    "SMOKE",
    "CH2O",
    "SCC",
    "FAF",
    "TUE",
    "CALC",
    "MTRANS",
];

macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Accepted wire values, in display order.
            pub const CHOICES: &'static [&'static str] = &[$($text),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }

            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $($text => Some(Self::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

choice_enum! {
    pub enum Gender {
        Male => "Male",
        Female => "Female",
    }
}

choice_enum! {
    /// Binary survey answer.
    pub enum YesNo {
        Yes => "yes",
        No => "no",
    }
}

choice_enum! {
    /// Eating between meals (CAEC).
    pub enum SnackFrequency {
        No => "no",
        Sometimes => "Sometimes",
        Frequently => "Frequently",
        Always => "Always",
    }
}

choice_enum! {
    /// Alcohol consumption (CALC).
    pub enum AlcoholFrequency {
        No => "no",
        Sometimes => "Sometimes",
        Frequently => "Frequently",
    }
}

choice_enum! {
    /// Primary mode of transportation (MTRANS).
    pub enum Transport {
        Walking => "Walking",
        Bike => "Bike",
        Motorbike => "Motorbike",
        PublicTransportation => "Public_Transportation",
        Automobile => "Automobile",
    }
}

/// Categorical columns and their accepted values.
pub const CATEGORICAL_FIELDS: [(&str, &[&str]); 8] = [
    ("Gender", Gender::CHOICES),
    ("family_history_with_overweight", YesNo::CHOICES),
    ("FAVC", YesNo::CHOICES),
    ("CAEC", SnackFrequency::CHOICES),
    ("SMOKE", YesNo::CHOICES),
    ("SCC", YesNo::CHOICES),
    ("CALC", AlcoholFrequency::CHOICES),
    ("MTRANS", Transport::CHOICES),
];

/// Domain of a numeric column. `max: None` means unbounded above.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericBounds {
    pub field: &'static str,
    pub min: f64,
    pub max: Option<f64>,
}

impl NumericBounds {
    pub fn contains(&self, value: f64) -> bool {
        value.is_finite() && value >= self.min && self.max.map_or(true, |max| value <= max)
    }
}

pub const NUMERIC_BOUNDS: [NumericBounds; 8] = [
    NumericBounds { field: "Age", min: 15.0, max: None },
    NumericBounds { field: "Height", min: 1.0, max: None },
    NumericBounds { field: "Weight", min: 20.0, max: None },
    NumericBounds { field: "FCVC", min: 1.0, max: Some(3.0) },
    NumericBounds { field: "NCP", min: 1.0, max: Some(4.0) },
    NumericBounds { field: "CH2O", min: 1.0, max: Some(3.0) },
    NumericBounds { field: "FAF", min: 0.0, max: Some(3.0) },
    NumericBounds { field: "TUE", min: 0.0, max: Some(2.0) },
];

/// A single column value before numeric encoding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue {
    Numeric(f64),
    Category(&'static str),
}

/// Survey answers submitted for one prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(rename = "Gender")]
    pub gender: Gender,
    #[serde(rename = "Age", deserialize_with = "deserialize_whole_number")]
    pub age: i64,
    /// Meters
    #[serde(rename = "Height")]
    pub height: f64,
    /// Kilograms
    #[serde(rename = "Weight")]
    pub weight: f64,
    pub family_history_with_overweight: YesNo,
    /// Frequent consumption of high caloric food
    #[serde(rename = "FAVC")]
    pub favc: YesNo,
    /// Vegetable consumption frequency
    #[serde(rename = "FCVC")]
    pub fcvc: f64,
    /// Number of main meals
    #[serde(rename = "NCP")]
    pub ncp: f64,
    #[serde(rename = "CAEC")]
    pub caec: SnackFrequency,
    #[serde(rename = "SMOKE")]
    pub smoke: YesNo,
    /// Daily water intake
    #[serde(rename = "CH2O")]
    pub ch2o: f64,
    /// Calorie consumption monitoring
    #[serde(rename = "SCC")]
    pub scc: YesNo,
    /// Physical activity frequency
    #[serde(rename = "FAF")]
    pub faf: f64,
    /// Time using technology devices
    #[serde(rename = "TUE")]
    pub tue: f64,
    #[serde(rename = "CALC")]
    pub calc: AlcoholFrequency,
    #[serde(rename = "MTRANS")]
    pub mtrans: Transport,
}

impl PredictionRequest {
    /// Field values in training column order, paired with their names.
    pub fn ordered_values(&self) -> [(&'static str, FeatureValue); NUM_FEATURES] {
        use FeatureValue::{Category, Numeric};

        [
            (FEATURE_ORDER[0], Category(self.gender.as_str())),
            (FEATURE_ORDER[1], Numeric(self.age as f64)),
            (FEATURE_ORDER[2], Numeric(self.height)),
            (FEATURE_ORDER[3], Numeric(self.weight)),
            (FEATURE_ORDER[4], Category(self.family_history_with_overweight.as_str())),
            (FEATURE_ORDER[5], Category(self.favc.as_str())),
            (FEATURE_ORDER[6], Numeric(self.fcvc)),
            (FEATURE_ORDER[7], Numeric(self.ncp)),
            (FEATURE_ORDER[8], Category(self.caec.as_str())),
            (FEATURE_ORDER[9], Category(self.smoke.as_str())),
            (FEATURE_ORDER[10], Numeric(self.ch2o)),
            (FEATURE_ORDER[11], Category(self.scc.as_str())),
            (FEATURE_ORDER[12], Numeric(self.faf)),
            (FEATURE_ORDER[13], Numeric(self.tue)),
            (FEATURE_ORDER[14], Category(self.calc.as_str())),
            (FEATURE_ORDER[15], Category(self.mtrans.as_str())),
        ]
    }

    /// Numeric value of a bounded column, if `field` is one.
    pub fn numeric_field(&self, field: &str) -> Option<f64> {
        self.ordered_values()
            .into_iter()
            .find(|(name, _)| *name == field)
            .and_then(|(_, value)| match value {
                FeatureValue::Numeric(v) => Some(v),
                FeatureValue::Category(_) => None,
            })
    }
}

/// Integers, plus floats with no fractional part (`31.0`), as JSON clients
/// that only have one number type send them.
fn deserialize_whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    struct WholeNumber;

    impl<'de> de::Visitor<'de> for WholeNumber {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a whole number")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
            if v.is_finite() && v.fract() == 0.0 && v.abs() <= i64::MAX as f64 / 2.0 {
                Ok(v as i64)
            } else {
                Err(E::invalid_value(de::Unexpected::Float(v), &self))
            }
        }
    }

    deserializer.deserialize_any(WholeNumber)
}
