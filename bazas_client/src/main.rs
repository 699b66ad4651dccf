use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

use bazas_core::{Card, ClientMessage, PlayerSecret, ServerMessage, Settings};

#[derive(Debug, Parser)]
#[command(name = "bazas_client", about = "Bazas 命令行客户端")]
struct Args {
    /// 服务器的 WebSocket 地址
    #[arg(long, env = "BAZAS_URL", default_value = "ws://127.0.0.1:8080/ws")]
    url: Url,
}

/// 把一行输入解析成要发送的消息。`Err` 中是给用户看的提示。
fn parse_command(line: &str) -> Result<Option<ClientMessage>, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let msg = match parts.as_slice() {
        [] => return Ok(None),
        ["create", name] => ClientMessage::CreateRoom { name: name.to_string(), settings: Settings::default() },
        ["create", name, start, end] => {
            let settings = Settings {
                initial_card_amount: start.parse().map_err(|_| format!("无效的起始牌数: {start}"))?,
                last_card_amount: end.parse().map_err(|_| format!("无效的最高牌数: {end}"))?,
            };
            ClientMessage::CreateRoom { name: name.to_string(), settings }
        }
        ["join", room_id, name] => ClientMessage::JoinRoom {
            room_id: room_id.to_string(),
            name: name.to_string(),
            secret: None,
        },
        ["join", room_id, name, secret] => {
            let secret: PlayerSecret = secret.parse().map_err(|_| format!("无效的凭证: {secret}"))?;
            ClientMessage::JoinRoom { room_id: room_id.to_string(), name: name.to_string(), secret: Some(secret) }
        }
        ["start"] => ClientMessage::StartGame,
        ["bid", n] => ClientMessage::RequestBazas(n.parse().map_err(|_| format!("无效的墩数: {n}"))?),
        ["play", card] => card.parse::<Card>().map_err(|e| e.to_string())?.into(),
        _ => return Err(format!("未知命令: {line}")),
    };
    Ok(Some(msg))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    println!("正在连接到: {}", args.url);
    let (ws_stream, _) = connect_async(args.url.as_str()).await?;
    println!("连接成功!");

    let (mut write, mut read) = ws_stream.split();

    // 启动一个任务来处理从服务器接收的消息
    tokio::spawn(async move {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<ServerMessage>(&text) {
                        Ok(ServerMessage::Cards { hand }) => {
                            let keys: Vec<String> = hand.iter().map(|c| c.key()).collect();
                            println!("\n<-- [手牌]: {}\n", keys.join(" "));
                        }
                        Ok(server_msg) => {
                            // 简单地将收到的消息打印到控制台
                            println!("\n<-- [服务器消息]:\n{:#?}\n", server_msg);
                        }
                        Err(e) => eprintln!("解析服务器消息失败: {}", e),
                    }
                    print!("> "); // 重新显示输入提示符
                    let _ = std::io::stdout().flush();
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("接收消息时出错: {}", e);
                    break;
                }
            }
        }
    });

    // 主任务处理用户输入
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    println!("--- Bazas 客户端 ---");
    println!("可用命令:");
    println!("  create <昵称> [起始 最高]       - 创建一个新房间");
    println!("  join <房间号> <昵称> [凭证]     - 加入房间，带凭证即为重连");
    println!("  start                           - 开始游戏");
    println!("  bid <墩数>                      - 叫墩");
    println!("  play <牌>                       - 出牌，例如 AH、0S、7C");
    println!("  exit                            - 退出");

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = stdin.next_line().await? else { break };
        if line.trim() == "exit" {
            println!("正在断开连接...");
            break;
        }

        match parse_command(&line) {
            Ok(Some(msg)) => {
                let payload = serde_json::to_string(&msg)?;
                write.send(Message::Text(payload.into())).await?;
            }
            Ok(None) => {}
            Err(hint) => println!("{hint}"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazas_core::{Rank, Suit};

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("  "), Ok(None));
        assert_eq!(parse_command("start"), Ok(Some(ClientMessage::StartGame)));
        assert_eq!(parse_command("bid 2"), Ok(Some(ClientMessage::RequestBazas(2))));
        assert_eq!(
            parse_command("play 0h"),
            Ok(Some(ClientMessage::PlayCard(Card::new(Rank::Ten, Suit::Heart))))
        );
        assert_eq!(
            parse_command("create Ana 2 6"),
            Ok(Some(ClientMessage::CreateRoom {
                name: "Ana".into(),
                settings: Settings { initial_card_amount: 2, last_card_amount: 6 },
            }))
        );
        assert_eq!(
            parse_command("join Ab3dE9x Beto"),
            Ok(Some(ClientMessage::JoinRoom { room_id: "Ab3dE9x".into(), name: "Beto".into(), secret: None }))
        );
    }

    #[test]
    fn test_parse_command_errors() {
        assert!(parse_command("bid many").is_err());
        assert!(parse_command("play ZZ").is_err());
        assert!(parse_command("join room name not-a-uuid").is_err());
        assert!(parse_command("dance").is_err());
    }
}
