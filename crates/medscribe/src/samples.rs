//! Sample encounter transcripts for the demo and tests.
//!
//! All transcripts are fictional. No real patient information is present.

/// One named transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub name: &'static str,
    pub description: &'static str,
    pub transcript: &'static str,
}

pub const SAMPLES: &[Sample] = &[
    Sample {
        name: "chest-pain",
        description: "Crushing chest pain with cardiac risk factors (STEMI pattern)",
        transcript: "Patient is a fifty-eight year old man. He says he has crushing chest pain \
                     radiating to his left arm. It started about 2 hours ago and is getting worse. \
                     He is diaphoretic and nauseous. Denies fever or cough. History of hypertension \
                     and diabetes. He takes lisinopril 10 mg daily and metformin 500 mg twice daily. \
                     Allergic to penicillin, which causes hives. BP 160/95, heart rate 104, \
                     oxygen saturation 97.",
    },
    Sample {
        name: "stroke",
        description: "Sudden facial droop, slurred speech and arm weakness",
        transcript: "My wife noticed my face drooping and I have slurred speech. It started \
                     suddenly about 30 minutes ago. I also have arm weakness on the left side. \
                     History of atrial fibrillation, I take warfarin 5 mg daily. \
                     No known drug allergies. Blood pressure 182/100, pulse 88.",
    },
    Sample {
        name: "medication-review",
        description: "Home medication list with an allergy and no acute complaint",
        transcript: "Lisinopril 10 milligrams by mouth once daily for high blood pressure. \
                     She also takes atorvastatin 40 mg at bedtime and albuterol as needed. \
                     She is allergic to sulfa, which gave her a rash.",
    },
    Sample {
        name: "implausible-vitals",
        description: "Vital signs outside plausibility bounds",
        transcript: "BP 300 over 180, heart rate 220",
    },
    Sample {
        name: "small-talk",
        description: "No clinical content",
        transcript: "The weather has been lovely and the parking lot was full today.",
    },
];

/// Look up a sample by name.
pub fn sample(name: &str) -> Option<&'static Sample> {
    SAMPLES.iter().find(|s| s.name == name)
}
