//! `icon-harvest flavours`: print the archive variants.

use icon_harvest_core::config::{Flavour, HarvestConfig};

pub fn list_flavours(cfg: &HarvestConfig) {
    for flavour in Flavour::ALL {
        let marker = if flavour == cfg.flavour { "*" } else { " " };
        println!("{} {:<10} {}", marker, flavour.as_str(), flavour.hint());
    }
}
