//! Repository implementations of the domain ports

pub mod rooms;
pub mod residents;
pub mod payments;
pub mod settlements;
pub mod sequences;
pub mod transfers;

pub use rooms::RoomRepository;
pub use residents::ResidentRepository;
pub use payments::PaymentRepository;
pub use settlements::SettlementRepository;
pub use sequences::SequenceRepository;
pub use transfers::TransferRepository;
