//! Value pools for the scalar attributes assigned after the relational pass.

pub const JOBS: &[&str] = &[
    "accountant",
    "air cabin crew",
    "architect",
    "baker",
    "biomedical scientist",
    "carpenter",
    "chemist",
    "civil engineer",
    "dentist",
    "electrician",
    "firefighter",
    "graphic designer",
    "journalist",
    "lecturer",
    "librarian",
    "nurse",
    "pharmacist",
    "pilot",
    "police officer",
    "realtor",
    "software developer",
    "translator",
    "veterinarian",
];

pub const HOBBIES: &[&str] = &[
    "baking",
    "birdwatching",
    "chess",
    "cycling",
    "gardening",
    "hiking",
    "knitting",
    "painting",
    "photography",
    "pottery",
    "rock climbing",
    "sailing",
    "swimming",
    "woodworking",
    "yoga",
];

/// Founders are born in this year or up to `BIRTH_YEAR_SPREAD - 1` years later.
pub const FOUNDER_BIRTH_YEAR: i32 = 1900;

/// Years between the birth cohorts of consecutive generation brackets.
pub const GENERATION_SPAN: i32 = 25;

pub const BIRTH_YEAR_SPREAD: i32 = 10;
