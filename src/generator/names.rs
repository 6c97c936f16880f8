//! Name pools. A person's name is "First Last"; children take the father's surname.

pub const MALE_FIRST_NAMES: &[&str] = &[
    "Adam", "Adrian", "Alan", "Albert", "Arthur", "Benjamin", "Carlos", "Daniel", "David",
    "Edward", "Elias", "Felix", "Frank", "George", "Hassan", "Henry", "Hugo", "Isaac", "Ivan",
    "Jack", "James", "Jonas", "Joseph", "Kenji", "Leon", "Liam", "Lucas", "Marco", "Martin",
    "Matteo", "Michael", "Nathan", "Noah", "Oliver", "Omar", "Oscar", "Paul", "Peter", "Rafael",
    "Ryan", "Samuel", "Simon", "Thomas", "Victor", "William",
];

pub const FEMALE_FIRST_NAMES: &[&str] = &[
    "Ada", "Alice", "Amelia", "Anna", "Beatrice", "Camila", "Charlotte", "Clara", "Daria",
    "Elena", "Eliza", "Emma", "Eva", "Fatima", "Grace", "Hana", "Helga", "Ida", "Iris", "Isabel",
    "Julia", "Laura", "Lena", "Lucia", "Maria", "Marta", "Maya", "Mei", "Mia", "Nadia", "Nina",
    "Olivia", "Paula", "Priya", "Rosa", "Ruth", "Sara", "Sofia", "Sophie", "Tara", "Vera",
    "Yara", "Zoe",
];

pub const SURNAMES: &[&str] = &[
    "Alvarez", "Andersen", "Baker", "Bauer", "Brooks", "Carter", "Chen", "Costa", "Dubois",
    "Fischer", "Garcia", "Hansen", "Hoffmann", "Ito", "Jensen", "Khan", "Kowalski", "Larsen",
    "Lopez", "Moreau", "Muller", "Nakamura", "Novak", "Okafor", "Patel", "Petrov", "Rossi",
    "Schmidt", "Silva", "Tanaka", "Wagner", "Wang", "Weber", "Williams", "Yilmaz",
];
