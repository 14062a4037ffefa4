pub mod analyzer;
pub mod classifier;
pub mod graph;
pub mod inspector;
pub mod name;
pub mod resolver;
pub mod scanner;

pub use analyzer::{worker_pool, DirectoryAnalyzer};
pub use classifier::LibraryClassifier;
pub use graph::{
    BundledLibrary, Category, DependencyGraph, DllNode, EdgeKind, ExternalLibrary, Forest,
    ForestBuilder,
};
pub use inspector::{FileInspector, FileRecord, LOADER_LIBRARIES, LOADER_SYMBOLS};
pub use name::DllName;
pub use resolver::DependencyResolver;
pub use scanner::{FileScanner, DEFAULT_EXTENSIONS};
