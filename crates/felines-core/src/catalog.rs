//! Static catalog: breeds and facts shown alongside the engagement engine.
//!
//! Read-only data; the engine never mutates or validates it.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Breed {
    pub name: &'static str,
    pub origin: &'static str,
    pub temperament: &'static str,
}

impl Breed {
    /// Temperament split into individual traits.
    pub fn traits(&self) -> impl Iterator<Item = &'static str> {
        self.temperament.split(',').map(str::trim)
    }
}

pub static BREEDS: [Breed; 4] = [
    Breed {
        name: "Siamese",
        origin: "Thailand",
        temperament: "Vocal, Affectionate, Intelligent",
    },
    Breed {
        name: "Persian",
        origin: "Iran",
        temperament: "Gentle, Quiet, Dignified",
    },
    Breed {
        name: "Maine Coon",
        origin: "United States",
        temperament: "Gentle, Friendly, Intelligent",
    },
    Breed {
        name: "British Shorthair",
        origin: "United Kingdom",
        temperament: "Calm, Patient, Intelligent",
    },
];

pub const FACTS: [&str; 5] = [
    "Cats have been domesticated for over 4,000 years.",
    "They can make over 100 different vocal sounds.",
    "A group of cats is called a 'clowder'.",
    "Cats spend 70% of their lives sleeping.",
    "They have an excellent sense of balance and flexible bodies.",
];

pub const DID_YOU_KNOW: &str = "Cats have a unique way of walking. Unlike most mammals, they \
directly register, meaning their hind paws fall almost exactly in the same place as their \
front paws when they walk.";

pub fn find_breed(name: &str) -> Option<&'static Breed> {
    BREEDS.iter().find(|b| b.name.eq_ignore_ascii_case(name.trim()))
}

/// Badge text next to the like button; nothing until the first like.
pub fn like_badge(count: u64) -> Option<String> {
    match count {
        0 => None,
        1 => Some("1 Like".to_string()),
        n => Some(format!("{n} Likes")),
    }
}

/// The heart icon fills after the first like.
pub fn heart_filled(count: u64) -> bool {
    count > 0
}
