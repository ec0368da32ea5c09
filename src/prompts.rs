pub const ASK_SYSTEM: &str = include_str!("../data/prompts/ask_system.txt");
