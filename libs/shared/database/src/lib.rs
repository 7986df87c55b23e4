pub mod slot_store;
pub mod supabase;

pub use slot_store::SlotStore;
pub use supabase::SupabaseClient;
