#![allow(dead_code)]

use portalbox_backend::{CardRecord, Directory, EquipmentProfile, InMemoryBackend, UserRecord};
use portalbox_core::{AuthorityLevel, CardId, CardType};

pub const LASER: i64 = 10;
pub const PRINTER: i64 = 20;

pub const ADA: u32 = 0x0100_0001;
pub const ALAN: u32 = 0x0100_0002;
pub const BROKE: u32 = 0x0100_0003;
pub const PROXY: u32 = 0x0200_0001;
pub const TRAINING: u32 = 0x0300_0001;
pub const SHUTDOWN: u32 = 0x0400_0001;

pub fn card(id: u32) -> CardId {
    CardId::new(id).unwrap()
}

fn user_card(id: u32, user_id: i64) -> CardRecord {
    CardRecord {
        id: card(id),
        card_type: CardType::User,
        user_id: Some(user_id),
        equipment_types: vec![],
    }
}

/// Laser cutter needs training, 3D printer needs payment only.
pub fn directory() -> Directory {
    Directory {
        equipment: vec![
            EquipmentProfile {
                id: 1,
                mac_address: "b8:27:eb:00:00:01".parse().unwrap(),
                type_id: LASER,
                type_name: "Laser Cutter".to_string(),
                location: "Makerspace".to_string(),
                timeout_minutes: 60,
                allow_proxy: true,
                requires_training: true,
                requires_payment: false,
            },
            EquipmentProfile {
                id: 2,
                mac_address: "b8:27:eb:00:00:02".parse().unwrap(),
                type_id: PRINTER,
                type_name: "3D Printer".to_string(),
                location: "Library".to_string(),
                timeout_minutes: 0,
                allow_proxy: false,
                requires_training: false,
                requires_payment: true,
            },
        ],
        cards: vec![
            user_card(ADA, 1),
            user_card(ALAN, 2),
            user_card(BROKE, 3),
            CardRecord {
                id: card(PROXY),
                card_type: CardType::Proxy,
                user_id: None,
                equipment_types: vec![],
            },
            CardRecord {
                id: card(TRAINING),
                card_type: CardType::Training,
                user_id: None,
                equipment_types: vec![LASER],
            },
            CardRecord {
                id: card(SHUTDOWN),
                card_type: CardType::Shutdown,
                user_id: None,
                equipment_types: vec![],
            },
        ],
        users: vec![
            UserRecord {
                authority_level: AuthorityLevel::Trainer,
                authorizations: vec![LASER],
                balance: 5.0,
                ..UserRecord::new(1, "Ada", "ada@example.edu")
            },
            UserRecord {
                balance: 1.0,
                ..UserRecord::new(2, "Alan", "alan@example.edu")
            },
            UserRecord {
                authorizations: vec![LASER],
                ..UserRecord::new(3, "Broke", "broke@example.edu")
            },
        ],
    }
}

pub fn backend() -> InMemoryBackend {
    InMemoryBackend::new(directory())
}
