//! Closed option sets offered by the registration forms.
//!
//! Each variant serializes to the exact label stored in the backend, so a
//! value outside the set fails deserialization instead of reaching a table.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not a valid {set}")]
pub struct UnknownOption {
    pub set: &'static str,
    pub value: String,
}

macro_rules! option_set {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant,
            )+
        }

        impl $name {
            /// Every option in display order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }

        impl FromStr for $name {
            type Err = UnknownOption;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|option| option.label() == s)
                    .ok_or_else(|| UnknownOption {
                        set: stringify!($name),
                        value: s.to_string(),
                    })
            }
        }
    };
}

option_set! {
    /// Faculty the student belongs to.
    Department {
        Informatics => "情報学部",
        Management => "経営学部",
    }
}

option_set! {
    GraduationYear {
        Y2025 => "2025年卒",
        Y2026 => "2026年卒",
        Y2027 => "2027年卒",
    }
}

option_set! {
    /// How the entry sheet was submitted.
    EsFormat {
        Resume => "履歴書の提出",
        WebForm => "フォームの回答",
    }
}

option_set! {
    Difficulty {
        Easy => "易しい",
        Normal => "普通",
        Hard => "難しい",
        VeryHard => "とても難しい",
    }
}

option_set! {
    TestFormat {
        Coding => "コーディング形式",
        MultipleChoice => "選択形式",
        Written => "記述形式",
        Mixed => "複合形式",
    }
}

option_set! {
    /// Shared by coding tests and interviews.
    Duration {
        Min30 => "30分",
        Min45 => "45分",
        Min60 => "60分",
        Min90 => "90分",
        Min120 => "120分",
        Over120 => "120分以上",
    }
}

option_set! {
    ProgrammingLanguage {
        Java => "Java",
        Python => "Python",
        Cpp => "C++",
        JavaScript => "JavaScript",
        TypeScript => "TypeScript",
        CSharp => "C#",
        Ruby => "Ruby",
        Go => "Go",
        Swift => "Swift",
        Kotlin => "Kotlin",
        Php => "PHP",
        Other => "その他",
    }
}

option_set! {
    InterviewType {
        First => "1次面接",
        Second => "2次面接",
        Third => "3次面接",
        Final => "最終面接",
        Casual => "カジュアル面談",
    }
}

option_set! {
    InterviewFormat {
        InPerson => "対面",
        Online => "オンライン",
        Hybrid => "ハイブリッド",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_to_stored_label() {
        let json = serde_json::to_string(&Difficulty::VeryHard).unwrap();
        assert_eq!(json, "\"とても難しい\"");
    }

    #[test]
    fn test_unknown_label_rejected_by_serde() {
        let parsed: Result<InterviewFormat, _> = serde_json::from_str("\"電話\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn test_from_str_matches_labels() {
        assert_eq!("C++".parse::<ProgrammingLanguage>(), Ok(ProgrammingLanguage::Cpp));
        assert_eq!("2026年卒".parse::<GraduationYear>(), Ok(GraduationYear::Y2026));
        let err = "2030年卒".parse::<GraduationYear>().unwrap_err();
        assert_eq!(err.set, "GraduationYear");
    }

    #[test]
    fn test_all_lists_every_option_once() {
        assert_eq!(Duration::ALL.len(), 6);
        assert_eq!(ProgrammingLanguage::ALL.len(), 12);
        assert_eq!(InterviewType::ALL[3], InterviewType::Final);
    }
}
