// Entry point for the relay-chain node binary
use clap::Parser;
use data_encoding::HEXLOWER;
use log::{error, info, LevelFilter};
use relay_chain::utils::new_key_pair;
use relay_chain::{
    decode_hex, send_transaction, Command, Config, MinerIdentity, MiningLoop, Node, Opt, Server,
    Transaction,
};
use std::process;

fn main() {
    // Info level unless RUST_LOG says otherwise
    env_logger::builder()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let opt = Opt::parse();

    if let Err(e) = run_command(opt.command) {
        error!("Error: {e}");
        process::exit(1);
    }
}

fn run_command(command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::StartNode(args) => {
            let mut config = Config::load(args.config.as_deref())?;
            args.apply(&mut config);

            let node = Node::from_config(&config)?;
            info!(
                "Miner public key {}, rewards to {}",
                HEXLOWER.encode(node.get_identity().get_public_key()),
                HEXLOWER.encode(node.get_identity().get_owner_public_key())
            );

            let listener = Server::bind(&config.get_node_addr())?;
            let miner = MiningLoop::new(node.clone()).spawn()?;
            Server::new(node.clone()).serve(listener)?;

            node.shutdown();
            if miner.join().is_err() {
                return Err("Mining thread panicked".into());
            }
        }
        Command::CreateKey => {
            let pkcs8 = new_key_pair()?;
            let identity = MinerIdentity::from_pkcs8(pkcs8, None)?;
            println!("Private key (PKCS#8): {}", HEXLOWER.encode(identity.get_pkcs8()));
            println!("Public key: {}", HEXLOWER.encode(identity.get_public_key()));
        }
        Command::Send {
            node,
            key,
            to,
            amount,
            inputs,
        } => {
            let pkcs8 = decode_hex(&key)?;
            let recipient = decode_hex(&to)?;
            let inputs = inputs
                .iter()
                .map(|input| decode_hex(input))
                .collect::<Result<Vec<_>, _>>()?;

            let tx = Transaction::new_transfer(&pkcs8, &recipient, amount, &inputs)?;
            let config = Config::load(None)?;
            send_transaction(&config.get_node_addr(), &node, &tx, config.peer_timeout())?;
            println!("Sent transaction {}", tx.get_id_hex());
        }
    }
    Ok(())
}
