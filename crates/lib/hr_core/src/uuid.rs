// Helper for generating UUIDv7 (timestamp-sortable UUIDs)
//
// OTP records are an append-only audit trail, so their ids are generated
// app-side as UUIDv7 to keep them sortable by creation time. Principal ids
// are plain v4.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}
