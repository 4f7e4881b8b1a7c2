use anyhow::Result;
use rzmq_lifecycle::SocketType;

pub fn list() -> Result<()> {
  println!("{:<8} {}", "ID", "PATTERN");
  for socket_type in SocketType::ALL {
    println!("{:<8} {}", socket_type.as_raw(), socket_type.name());
  }
  println!("\nAliases: REQUEST, REPLY, PUBLISH, SUBSCRIBE. A ZMQ_ prefix is accepted.");
  Ok(())
}
