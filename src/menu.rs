//! The fixed menu and a per-customer random item picker.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::MenuItem;

pub const MENU: [MenuItem; 10] = [
    "BensChilli",
    "BensHalfSmoke",
    "BensHotDog",
    "BensChilliCheeseFries",
    "BensShake",
    "BensHotCakes",
    "BensCake",
    "BensHamburger",
    "BensVeggieBurger",
    "BensOnionRings",
];

/// Picks menu items uniformly at random.
pub struct MenuPicker {
    rng: StdRng,
}

impl MenuPicker {
    /// Seeded pickers are reproducible; `None` draws from OS entropy.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    pub fn pick(&mut self) -> MenuItem {
        MENU[self.rng.gen_range(0..MENU.len())]
    }
}
