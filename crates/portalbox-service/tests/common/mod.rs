#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use portalbox_backend::mock::RecordingNotifier;
use portalbox_backend::{
    AccessBackend, BackendEvent, CardDetails, CardRecord, Directory, EquipmentProfile, InMemoryBackend, MacAddress,
    UserRecord,
};
use portalbox_core::{AuthorityLevel, CardId, CardType};
use portalbox_service::{EmulatorHandles, PortalBoxService, ServiceConfig, emulated_peripherals};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

pub const LASER: i64 = 10;
pub const LASER_MAC: &str = "b8:27:eb:00:00:01";

pub const ADA: u32 = 0x0100_0001;
pub const ALAN: u32 = 0x0100_0002;
pub const SHUTDOWN: u32 = 0x0400_0001;

pub fn card(id: u32) -> CardId {
    CardId::new(id).unwrap()
}

/// One laser cutter with a one minute timeout. Ada is trained on it, Alan
/// is not.
pub fn directory() -> Directory {
    Directory {
        equipment: vec![EquipmentProfile {
            id: 1,
            mac_address: LASER_MAC.parse().unwrap(),
            type_id: LASER,
            type_name: "Laser Cutter".to_string(),
            location: "Makerspace".to_string(),
            timeout_minutes: 1,
            allow_proxy: true,
            requires_training: true,
            requires_payment: false,
        }],
        cards: vec![
            CardRecord {
                id: card(ADA),
                card_type: CardType::User,
                user_id: Some(1),
                equipment_types: vec![],
            },
            CardRecord {
                id: card(ALAN),
                card_type: CardType::User,
                user_id: Some(2),
                equipment_types: vec![],
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
                authority_level: AuthorityLevel::User,
                authorizations: vec![LASER],
                ..UserRecord::new(1, "Ada", "ada@example.edu")
            },
            UserRecord::new(2, "Alan", "alan@example.edu"),
        ],
    }
}

/// Configuration for an emulated laser cutter box writing its watchdog
/// files under `dir`.
pub fn config(dir: &Path) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.identity.mac_address = Some(LASER_MAC.parse().unwrap());
    config.watchdog.running_file = dir.join("running");
    config.watchdog.activity_file = dir.join("boxactivity");
    config.timing.grace_period_secs = 2;
    config.timing.timeout_grace_period_secs = 2;
    config.backend = directory();
    config
}

/// In-memory backend shared with the test, counting card lookups.
#[derive(Debug, Clone)]
pub struct CountingBackend {
    inner: Arc<InMemoryBackend>,
    lookups: Arc<AtomicUsize>,
}

impl CountingBackend {
    pub fn new(directory: Directory) -> Self {
        Self {
            inner: Arc::new(InMemoryBackend::new(directory)),
            lookups: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn events(&self) -> Vec<BackendEvent> {
        self.inner.events()
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.inner.set_reachable(reachable);
    }

    /// Calls to `get_card_details` so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl AccessBackend for CountingBackend {
    async fn get_equipment_profile(&self, mac: &MacAddress) -> portalbox_backend::Result<EquipmentProfile> {
        self.inner.get_equipment_profile(mac).await
    }

    async fn get_card_type(&self, card: CardId) -> portalbox_backend::Result<CardType> {
        self.inner.get_card_type(card).await
    }

    async fn get_card_details(&self, card: CardId, equipment_type_id: i64) -> portalbox_backend::Result<CardDetails> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.get_card_details(card, equipment_type_id).await
    }

    async fn is_training_card_valid(&self, card: CardId, equipment_type_id: i64) -> portalbox_backend::Result<bool> {
        self.inner.is_training_card_valid(card, equipment_type_id).await
    }

    async fn log_access_attempt(&self, card: CardId, equipment_id: i64, success: bool) -> portalbox_backend::Result<()> {
        self.inner.log_access_attempt(card, equipment_id, success).await
    }

    async fn log_access_completion(&self, card: CardId, equipment_id: i64) -> portalbox_backend::Result<()> {
        self.inner.log_access_completion(card, equipment_id).await
    }

    async fn log_started(&self, equipment_id: i64) -> portalbox_backend::Result<()> {
        self.inner.log_started(equipment_id).await
    }

    async fn log_shutdown(&self, equipment_id: i64, card: Option<CardId>) -> portalbox_backend::Result<()> {
        self.inner.log_shutdown(equipment_id, card).await
    }

    async fn get_user(&self, card: CardId) -> portalbox_backend::Result<UserRecord> {
        self.inner.get_user(card).await
    }
}

/// Everything a test needs to drive a running box from the outside.
pub struct Rig {
    pub handles: EmulatorHandles,
    pub backend: CountingBackend,
    pub notifier: RecordingNotifier,
    pub cancel: CancellationToken,
    pub dir: TempDir,
}

impl Rig {
    pub fn running_file(&self) -> PathBuf {
        self.dir.path().join("running")
    }

    pub fn activity_file(&self) -> PathBuf {
        self.dir.path().join("boxactivity")
    }

    pub fn read(&self, path: &Path) -> String {
        std::fs::read_to_string(path).unwrap_or_default()
    }
}

pub type TestService = PortalBoxService<CountingBackend, RecordingNotifier>;

/// A service over emulated peripherals, plus the rig to drive it.
pub fn rig_with(configure: impl FnOnce(&mut ServiceConfig, &Path)) -> (TestService, Rig) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    configure(&mut config, dir.path());

    let (peripherals, handles) = emulated_peripherals(&config.display).unwrap();
    let backend = CountingBackend::new(config.backend.clone());
    let notifier = RecordingNotifier::new();
    let cancel = CancellationToken::new();

    let service = PortalBoxService::new(config, backend.clone(), notifier.clone(), peripherals, cancel.clone());
    let rig = Rig {
        handles,
        backend,
        notifier,
        cancel,
        dir,
    };
    (service, rig)
}

pub fn rig() -> (TestService, Rig) {
    rig_with(|_, _| {})
}
