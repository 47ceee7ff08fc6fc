//! Word lists the generator draws synthetic people and places from.

pub const FIRST_NAMES: &[&str] = &[
    "Aaliyah", "Aaron", "Abigail", "Adam", "Aisha", "Alejandro", "Alice", "Amara", "Andre",
    "Angela", "Arjun", "Beatriz", "Benjamin", "Bianca", "Carlos", "Caroline", "Chen", "Chloe",
    "Daniel", "Deborah", "Diego", "Elena", "Emeka", "Emily", "Fatima", "Felix", "Gabriel",
    "Grace", "Hannah", "Hiroshi", "Ibrahim", "Isabel", "Jack", "Jasmine", "Javier", "Julia",
    "Kenji", "Laura", "Leon", "Lucia", "Malik", "Maria", "Mateo", "Mei", "Nadia", "Noah",
    "Olivia", "Omar", "Priya", "Rafael", "Rosa", "Samuel", "Sara", "Sofia", "Tariq", "Thomas",
    "Valentina", "Victor", "Yuki", "Zara",
];

pub const LAST_NAMES: &[&str] = &[
    "Adams", "Ahmed", "Alvarez", "Anderson", "Baker", "Brown", "Campbell", "Chen", "Clark",
    "Davis", "Diaz", "Evans", "Fernandez", "Garcia", "Gonzalez", "Green", "Hall", "Harris",
    "Hernandez", "Hill", "Ito", "Jackson", "Johnson", "Kim", "King", "Kumar", "Lee", "Lopez",
    "Martin", "Martinez", "Mensah", "Miller", "Moore", "Nakamura", "Nguyen", "Okafor", "Patel",
    "Perez", "Roberts", "Robinson", "Rodriguez", "Sanchez", "Scott", "Silva", "Singh", "Smith",
    "Taylor", "Thomas", "Thompson", "Walker", "White", "Williams", "Wilson", "Wright", "Young",
];

pub const CITIES: &[&str] = &[
    "Austin", "Boston", "Chicago", "Denver", "Lisbon", "London", "Madrid", "Nairobi", "Osaka",
    "Portland", "Seattle", "Singapore", "Toronto", "Vancouver", "Warsaw",
];

pub const EMAIL_DOMAINS: &[&str] = &["example.com", "example.org", "example.net"];
