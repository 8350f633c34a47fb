//! Example: List listening sockets and their owners as a table.

use portmem_core::{AddressFamily, ConnectionSource, SystemConnections, SystemInspector};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    println!("Enumerating sockets...\n");

    let connections = match SystemConnections::new().connections().await {
        Ok(connections) => connections,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let listening: Vec<_> = connections.iter().filter(|c| c.is_listening()).collect();
    let ipv6 = listening
        .iter()
        .filter(|c| c.family() == AddressFamily::Ipv6)
        .count();
    println!(
        "{} sockets, {} listening ({} IPv4, {} IPv6)\n",
        connections.len(),
        listening.len(),
        listening.len() - ipv6,
        ipv6
    );

    match SystemInspector::system().inspect().await {
        Ok(records) => {
            if records.is_empty() {
                println!("No listening ports found.");
                return;
            }

            println!("{:<6} {:<20} {:>8}", "PORT", "PROCESS", "MEM %");
            println!("{}", "-".repeat(36));

            for record in &records {
                println!(
                    "{:<6} {:<20} {:>8.2}",
                    record.port, record.process_name, record.memory_usage
                );
            }

            println!("\nTotal: {} ports", records.len());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
