mod in_memory_repository;

pub use in_memory_repository::InMemoryRepository;
