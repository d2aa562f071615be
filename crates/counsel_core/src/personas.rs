//! crates/counsel_core/src/personas.rs
//!
//! The fixed set of counselor personas and the prompt template they parameterize.

/// A named counselor and the behavioural description injected into its prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Persona {
    pub name: &'static str,
    pub description: &'static str,
}

/// All counselors offered to the user, in display order.
pub const PERSONAS: [Persona; 4] = [
    Persona {
        name: "CBT Therapist",
        description: "I use cognitive behavioral therapy techniques to help users challenge negative thoughts.",
    },
    Persona {
        name: "Mindfulness Coach",
        description: "I focus on mindfulness and meditation practices to reduce stress and anxiety.",
    },
    Persona {
        name: "Solution-Focused Counselor",
        description: "I provide actionable solutions to life’s problems using a positive and goal-oriented approach.",
    },
    Persona {
        name: "Empathetic Listener",
        description: "I provide a safe space to talk about emotions and feelings with empathy and compassion.",
    },
];

impl Persona {
    /// Looks up a persona by its exact name.
    pub fn find(name: &str) -> Option<&'static Persona> {
        PERSONAS.iter().find(|p| p.name == name)
    }

    pub fn names() -> impl Iterator<Item = &'static str> {
        PERSONAS.iter().map(|p| p.name)
    }

    /// Builds the single-shot generation prompt for `user_text`.
    ///
    /// The user text is appended verbatim; the model sees no earlier turns.
    pub fn build_prompt(&self, user_text: &str) -> String {
        format!(
            "You are a virtual {}. {} Respond to the user’s concern in a helpful and supportive way.\nUser: {}\nAI Counselor:",
            self.name, self.description, user_text
        )
    }
}
