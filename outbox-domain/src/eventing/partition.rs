//! 按消息 key 选择分区
//!
//! 使用 32 位 FNV-1a 哈希对分区数取模：同一 key 始终落在同一分区，
//! 从而保证同一聚合的事件在中间件侧保持相对顺序。
//!

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

fn fnv1a(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, b| {
        (hash ^ u32::from(*b)).wrapping_mul(FNV_PRIME)
    })
}

/// 计算 key 所属分区；`partitions` 为 0 时按 1 处理
pub fn partition_for(key: &[u8], partitions: u32) -> u32 {
    fnv1a(key) % partitions.max(1)
}
