mod batch;
mod dataloader;
mod decode;
mod image_folder;
mod in_memory;

pub use batch::{Batch, BatchSource, Batches};
pub use dataloader::{DataLoader, create_dataloaders};
pub use decode::{Decode, Netpbm, RawF32};
pub use image_folder::ImageFolder;
pub use in_memory::InMemoryDataset;
