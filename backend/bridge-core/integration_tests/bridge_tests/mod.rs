mod fx_ipc;
mod helpers;
mod osc_relay;
