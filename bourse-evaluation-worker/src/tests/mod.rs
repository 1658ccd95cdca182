// Copyright (c) 2024 BOURSE LABS

mod mock;
mod scenarios_assets;
mod scenarios_transaction;
