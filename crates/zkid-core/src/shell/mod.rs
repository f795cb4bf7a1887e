//! Presentation state for the upload page: upload session and wallet status.

mod session;
mod wallet;

pub use session::{
    DisplayState, RequestToken, UploadSession, FOUND_PREFIX, NO_DOB_MESSAGE, PROCESSING_MESSAGE,
};
pub use wallet::{PublicKey, StaticWallet, WalletConnection, WalletStatus};
