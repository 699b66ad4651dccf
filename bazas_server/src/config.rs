use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// 服务器配置，命令行参数优先，其次环境变量
#[derive(Debug, Clone, Parser)]
#[command(name = "bazas_server", about = "Bazas 多人纸牌游戏服务器")]
pub struct Config {
    /// 监听地址
    #[arg(long, env = "BAZAS_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// 监听端口
    #[arg(long, env = "BAZAS_PORT", default_value_t = 8080)]
    pub port: u16,

    /// 一墩出完后展示桌面的时间（毫秒）
    #[arg(long, env = "BAZAS_TRICK_PAUSE_MS", default_value_t = 5000)]
    pub trick_pause_ms: u64,

    /// 通过 HTTP 创建后一直没人加入的房间保留多久（秒）
    #[arg(long, env = "BAZAS_EMPTY_ROOM_TTL_SECS", default_value_t = 300)]
    pub empty_room_ttl_secs: u64,
}

impl Config {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn trick_pause(&self) -> Duration {
        Duration::from_millis(self.trick_pause_ms)
    }

    pub fn empty_room_ttl(&self) -> Duration {
        Duration::from_secs(self.empty_room_ttl_secs)
    }
}
